//! Provider-neutral compute model.
//!
//! These types are what callers of the compute adapter see; provider records
//! from [`crate::domain`] are translated into them by
//! [`crate::compute::transform`].

use std::fmt;

/// Portable node lifecycle state.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeStatus {
    /// Being provisioned.
    Pending,
    /// Powered on.
    Running,
    /// Powered off but retained.
    Suspended,
    /// Gone or archived.
    Terminated,
    /// In a failed state.
    Error,
    /// The provider reported a state this client does not know.
    Unrecognized,
}

impl NodeStatus {
    /// Upper-case label used in CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::Terminated => "TERMINATED",
            Self::Error => "ERROR",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system family derived from an image's distribution label.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OsFamily {
    /// Arch Linux.
    Arch,
    /// CentOS.
    CentOs,
    /// CoreOS.
    CoreOs,
    /// Debian.
    Debian,
    /// Fedora.
    Fedora,
    /// FreeBSD.
    FreeBsd,
    /// Ubuntu.
    Ubuntu,
    /// Anything else.
    Unrecognized,
}

impl OsFamily {
    /// Maps a distribution label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_distribution(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "arch" | "arch linux" => Self::Arch,
            "centos" => Self::CentOs,
            "coreos" => Self::CoreOs,
            "debian" => Self::Debian,
            "fedora" => Self::Fedora,
            "freebsd" => Self::FreeBsd,
            "ubuntu" => Self::Ubuntu,
            _ => Self::Unrecognized,
        }
    }

    /// Human readable family name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arch => "Arch Linux",
            Self::CentOs => "CentOS",
            Self::CoreOs => "CoreOS",
            Self::Debian => "Debian",
            Self::Fedora => "Fedora",
            Self::FreeBsd => "FreeBSD",
            Self::Ubuntu => "Ubuntu",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system installed by an image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperatingSystem {
    /// Distribution family.
    pub family: OsFamily,
    /// Version parsed from the image name, empty when none is present.
    pub version: String,
    /// Architecture parsed from the image name, for example `x64`.
    pub arch: String,
    /// Free text description; the image name.
    pub description: String,
    /// Whether the architecture is 64-bit.
    pub is_64_bit: bool,
}

/// Availability of a portable image.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ImageStatus {
    /// Ready to boot nodes from. The v1 catalog only lists usable images.
    Available,
}

/// Login details for a node.
#[derive(Clone, Eq, PartialEq)]
pub struct LoginCredentials {
    /// Login user.
    pub user: String,
    /// OpenSSH-encoded private key.
    pub private_key: Option<String>,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("user", &self.user)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// A bootable image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    /// Portable identifier.
    pub id: String,
    /// Provider identifier.
    pub provider_id: String,
    /// Display name.
    pub name: String,
    /// Description; the display name.
    pub description: String,
    /// Availability.
    pub status: ImageStatus,
    /// Installed operating system.
    pub operating_system: OperatingSystem,
    /// Credentials baked into the image, if any.
    pub default_credentials: Option<LoginCredentials>,
}

/// A hardware profile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hardware {
    /// Portable identifier.
    pub id: String,
    /// Provider identifier.
    pub provider_id: String,
    /// Display name.
    pub name: String,
    /// Memory in megabytes.
    pub ram_mb: i32,
    /// Virtual CPU count.
    pub processors: i32,
    /// Disk size in gigabytes.
    pub disk_gb: i32,
    /// Hourly price as reported by the provider.
    pub cost_per_hour: String,
}

/// A region nodes can be placed in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    /// Portable identifier.
    pub id: String,
    /// Description; the region display name.
    pub description: String,
    /// Region slug, for example `nyc2`.
    pub slug: String,
}

/// A node as seen by callers of the compute adapter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeMetadata {
    /// Portable identifier.
    pub id: String,
    /// Provider identifier.
    pub provider_id: String,
    /// Node name.
    pub name: String,
    /// Group encoded into the name, when the naming convention recognises one.
    pub group: Option<String>,
    /// Hardware profile, when the size is still in the catalog.
    pub hardware: Option<Hardware>,
    /// Region, when still in the catalog.
    pub location: Option<Location>,
    /// Identifier of the boot image.
    pub image_id: String,
    /// Operating system of the boot image, when the image is still listed.
    pub operating_system: Option<OperatingSystem>,
    /// Portable lifecycle state.
    pub status: NodeStatus,
    /// Provider lifecycle label.
    pub backend_status: String,
    /// Public addresses.
    pub public_addresses: Vec<String>,
    /// Private addresses.
    pub private_addresses: Vec<String>,
}

/// Provider-specific options for node creation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TemplateOptions {
    /// OpenSSH public key line to authorize on the node.
    pub public_key: Option<String>,
    /// Keys already registered with the provider to authorize.
    pub ssh_key_ids: Vec<i32>,
    /// Whether to enable private networking.
    pub private_networking: Option<bool>,
    /// Whether to enable automatic backups.
    pub backups_enabled: Option<bool>,
}

/// What to build a node from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    /// Provider image id.
    pub image_id: i32,
    /// Provider size id.
    pub hardware_id: i32,
    /// Provider region id.
    pub location_id: i32,
    /// Creation options.
    pub options: TemplateOptions,
}

/// Result of creating a node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeAndInitialCredentials<N> {
    /// Provider record of the new node.
    pub node: N,
    /// Portable identifier.
    pub id: String,
    /// Credentials known at creation time; resolved later when absent.
    pub credentials: Option<LoginCredentials>,
}

/// Request to capture a node as a new image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloneImageTemplate {
    /// Name of the image to create.
    pub name: String,
    /// Portable identifier of the node to snapshot.
    pub source_node_id: String,
}
