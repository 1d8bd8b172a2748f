//! Client library for the DigitalOcean v1 compute API.
//!
//! The crate wraps the provider's query-string API behind a typed transport,
//! interprets its `status` envelopes, and turns event-tracked mutations into
//! calls that return once the droplet or image has settled. On top of that it
//! offers a portable compute adapter, snapshot-based image cloning, and
//! provisioning of default SSH login credentials.

pub mod api;
pub mod compute;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod ssh;
pub mod test_support;

pub use api::{
    CreateDropletOptions, DigitalOceanTransport, DropletAction, HttpTransport, NewDroplet,
};
pub use compute::{
    CloneImageTemplate, DefaultCredentialsProvisioner, DigitalOceanComputeServiceAdapter,
    DigitalOceanImageExtension, LoginCredentials, NodeMetadata, NodeStatus, Template,
    TemplateOptions,
};
pub use config::{ConfigError, DigitalOceanConfig};
pub use error::{DigitalOceanError, Result};
pub use events::{EventKind, EventPoller, PollPolicies, PollPolicy};
