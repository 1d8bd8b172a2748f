//! Translation of provider records into the portable model.

use std::sync::LazyLock;

use regex::Regex;

use super::naming::NamingConvention;
use super::portable::{
    Hardware, Image, ImageStatus, Location, NodeMetadata, OperatingSystem, OsFamily,
};
use super::status::to_portable_status;
use crate::domain;

// "Ubuntu 12.10 x64"
pub(super) static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+(\.?\d+)?").ok());
pub(super) static ARCH_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"x\d{2}").ok());

const ARCH_64_BIT: &str = "x64";

fn first_match(pattern: &LazyLock<Option<Regex>>, input: &str) -> String {
    pattern
        .as_ref()
        .and_then(|regex| regex.find(input))
        .map(|found| found.as_str().to_owned())
        .unwrap_or_default()
}

/// Parses the operating system from an image's distribution and name.
#[must_use]
pub fn operating_system(distribution: &str, name: &str) -> OperatingSystem {
    let arch = first_match(&ARCH_PATTERN, name);
    OperatingSystem {
        family: OsFamily::from_distribution(distribution),
        version: first_match(&VERSION_PATTERN, name),
        is_64_bit: arch == ARCH_64_BIT,
        arch,
        description: name.to_owned(),
    }
}

/// Converts a provider image.
#[must_use]
pub fn to_image(image: &domain::Image) -> Image {
    let id = image.id.to_string();
    Image {
        provider_id: id.clone(),
        id,
        name: image.name.clone(),
        description: image.name.clone(),
        status: ImageStatus::Available,
        operating_system: operating_system(&image.distribution, &image.name),
        default_credentials: None,
    }
}

/// Converts a provider size.
#[must_use]
pub fn to_hardware(size: &domain::Size) -> Hardware {
    let id = size.id.to_string();
    Hardware {
        provider_id: id.clone(),
        id,
        name: size.name.clone(),
        ram_mb: size.memory,
        processors: size.cpu,
        disk_gb: size.disk,
        cost_per_hour: size.cost_per_hour.clone(),
    }
}

/// Converts a provider region.
#[must_use]
pub fn to_location(region: &domain::Region) -> Location {
    Location {
        id: region.id.clone(),
        description: region.name.clone(),
        slug: region.slug.clone(),
    }
}

/// Catalog snapshot used to resolve a droplet's references.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    /// Known images.
    pub images: Vec<domain::Image>,
    /// Known sizes.
    pub sizes: Vec<domain::Size>,
    /// Known regions.
    pub regions: Vec<domain::Region>,
}

impl Catalog {
    /// Converts a droplet, resolving its size, region and image against the
    /// catalog. References missing from the catalog are left empty.
    #[must_use]
    pub fn to_node(&self, droplet: &domain::Droplet, naming: &dyn NamingConvention) -> NodeMetadata {
        let region_id = droplet.region_id.to_string();
        let id = droplet.id.to_string();
        NodeMetadata {
            provider_id: id.clone(),
            id,
            name: droplet.name.clone(),
            group: naming.group_in_unique_name(&droplet.name),
            hardware: self
                .sizes
                .iter()
                .find(|size| size.id == droplet.size_id)
                .map(to_hardware),
            location: self
                .regions
                .iter()
                .find(|region| region.id == region_id)
                .map(to_location),
            image_id: droplet.image_id.to_string(),
            operating_system: self
                .images
                .iter()
                .find(|image| image.id == droplet.image_id)
                .map(|image| operating_system(&image.distribution, &image.name)),
            status: to_portable_status(droplet.status),
            backend_status: droplet.status.as_str().to_owned(),
            public_addresses: vec![droplet.ip.clone()],
            private_addresses: droplet.private_ip.iter().cloned().collect(),
        }
    }
}
