//! Error taxonomy shared by the transport, the event poller, and the
//! compute workflows.

use thiserror::Error;

use crate::config::ConfigError;
use crate::events::EventKind;
use crate::ssh::KeyFormatError;

/// Errors raised by the DigitalOcean client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DigitalOceanError {
    /// Raised on HTTP 401 or when the provider reports an authorization
    /// failure in the response envelope.
    #[error("authorization failed: {0}")]
    Authorization(String),
    /// Raised on HTTP 404 for endpoints that do not treat a missing resource
    /// as an absent value.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// Raised when the provider answers with an `ERROR` envelope.
    #[error("provider error: {0}")]
    Provider(String),
    /// Raised when an event does not complete within its budget.
    #[error("timeout waiting for {kind} on event {event_id}")]
    Timeout {
        /// Operation kind being awaited.
        kind: EventKind,
        /// Provider event identifier.
        event_id: i32,
    },
    /// Raised when an event reaches a terminal state other than `done`.
    #[error("operation tracked by event {event_id} failed")]
    OperationFailed {
        /// Provider event identifier.
        event_id: i32,
    },
    /// Wrapper for OpenSSH public-key codec failures.
    #[error("invalid public key: {0}")]
    KeyFormat(#[from] KeyFormatError),
    /// Raised when configuration is invalid or setup cannot complete.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raised when a node or image that must exist cannot be found.
    #[error("no such element: {0}")]
    NoSuchElement(String),
    /// Raised for I/O, HTTP status, and decoding failures.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ConfigError> for DigitalOceanError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

impl From<reqwest::Error> for DigitalOceanError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.without_url().to_string())
    }
}

impl From<serde_json::Error> for DigitalOceanError {
    fn from(value: serde_json::Error) -> Self {
        Self::Transport(format!("malformed response: {value}"))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DigitalOceanError>;
