//! Cross-provider compute workflows on top of the DigitalOcean transport.
//!
//! [`DigitalOceanComputeServiceAdapter`] turns the provider's event-based
//! mutations into calls that return once the droplet has reached the
//! requested state. [`DigitalOceanImageExtension`] clones droplets into
//! images and [`DefaultCredentialsProvisioner`] supplies a login for images
//! that carry none.

mod adapter;
pub mod credentials;
mod image_extension;
pub mod naming;
pub mod portable;
mod status;
pub mod transform;

pub use adapter::DigitalOceanComputeServiceAdapter;
pub use credentials::{
    DefaultCredentialsProvisioner, DefaultImageCredentials, GeneratedKeyPair, KeyPairGenerator,
    RsaKeyPairGenerator,
};
pub use image_extension::DigitalOceanImageExtension;
pub use naming::{NamingConvention, RandomSuffixNaming};
pub use portable::{
    CloneImageTemplate, Hardware, Image, LoginCredentials, NodeAndInitialCredentials,
    NodeMetadata, NodeStatus, Template, TemplateOptions,
};
pub use status::to_portable_status;

#[cfg(test)]
mod tests;
