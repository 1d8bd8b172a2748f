//! Catalog entities: images, regions, and sizes.

use serde::Deserialize;

/// A distribution image or user snapshot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Image {
    /// Provider identifier.
    pub id: i32,
    /// Display name, for example `Ubuntu 12.10 x64`.
    pub name: String,
    /// Distribution family label, for example `Ubuntu`.
    pub distribution: String,
    /// Whether the image is public or owned by the account.
    #[serde(default, rename = "public", deserialize_with = "super::null_as_false")]
    pub public_image: bool,
    /// Stable slug for public images.
    #[serde(default)]
    pub slug: Option<String>,
}

/// A datacenter region.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Region {
    /// Provider identifier.
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Stable slug, for example `nyc2`.
    pub slug: String,
}

/// A hardware profile.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Size {
    /// Provider identifier.
    pub id: i32,
    /// Display name, for example `512MB`.
    pub name: String,
    /// Stable slug.
    pub slug: String,
    /// Memory in megabytes.
    #[serde(default)]
    pub memory: i32,
    /// Virtual CPU count.
    #[serde(default)]
    pub cpu: i32,
    /// Disk size in gigabytes.
    #[serde(default)]
    pub disk: i32,
    /// Hourly price as reported by the provider.
    #[serde(deserialize_with = "super::string_or_number")]
    pub cost_per_hour: String,
    /// Monthly price as reported by the provider.
    #[serde(deserialize_with = "super::string_or_number")]
    pub cost_per_month: String,
}
