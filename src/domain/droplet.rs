//! Droplet records and their provider lifecycle states.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Lifecycle state reported by the provider for a droplet.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DropletStatus {
    /// Droplet is being provisioned.
    New,
    /// Droplet is powered on.
    Active,
    /// Droplet is powered off.
    Off,
    /// Droplet has been archived.
    Archive,
    /// Any state this client does not know about.
    #[serde(other)]
    Unrecognized,
}

impl DropletStatus {
    /// Returns the provider's lowercase label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Off => "off",
            Self::Archive => "archive",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// A DigitalOcean virtual machine.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Droplet {
    /// Provider identifier.
    pub id: i32,
    /// Droplet hostname.
    pub name: String,
    /// Image the droplet was built from.
    pub image_id: i32,
    /// Size (hardware profile) of the droplet.
    pub size_id: i32,
    /// Region hosting the droplet.
    pub region_id: i32,
    /// Whether automatic backups are enabled.
    #[serde(default, deserialize_with = "super::null_as_false")]
    pub backups_active: bool,
    /// Public IPv4 address.
    #[serde(rename = "ip_address")]
    pub ip: String,
    /// Private network address when private networking is enabled.
    #[serde(default, rename = "private_ip_address")]
    pub private_ip: Option<String>,
    /// Whether the droplet is locked by an in-flight operation.
    #[serde(default, deserialize_with = "super::null_as_false")]
    pub locked: bool,
    /// Provider lifecycle state.
    pub status: DropletStatus,
    /// Creation timestamp.
    #[serde(rename = "created_at")]
    pub created: DateTime<Utc>,
}

/// Partial droplet returned by the create call.
///
/// Only the identifier and the event tracking the build are meaningful; the
/// full record must be fetched once the event completes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct DropletCreation {
    /// Identifier of the new droplet.
    pub id: i32,
    /// Event tracking the build.
    pub event_id: i32,
}
