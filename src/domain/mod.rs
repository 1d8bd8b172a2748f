//! Value objects returned by the DigitalOcean v1 API.
//!
//! All types are immutable once decoded. Field names follow the provider's
//! JSON payloads through `serde` renames.

mod catalog;
mod droplet;
mod event;
mod ssh_key;

pub use catalog::{Image, Region, Size};
pub use droplet::{Droplet, DropletCreation, DropletStatus};
pub use event::{Event, EventStatus};
pub use ssh_key::SshKey;

use serde::{Deserialize, Deserializer};

/// Reads a JSON `null` boolean as `false`.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Reads a JSON string or number as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_text)
}

/// Reads an optional JSON string or number as text.
fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}
