//! Typed access to the DigitalOcean v1 REST API.

pub mod envelope;
mod http;
mod transport;

pub use http::HttpTransport;
pub use transport::{
    CreateDropletOptions, DigitalOceanTransport, DropletAction, NewDroplet, TransportFuture,
};
