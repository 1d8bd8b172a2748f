//! Typed operations exposed by the DigitalOcean v1 API.

use std::future::Future;
use std::pin::Pin;

use crate::domain::{Droplet, DropletCreation, Event, Image, Region, Size, SshKey};
use crate::error::Result;

/// Future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Provider-specific options accepted when creating a droplet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CreateDropletOptions {
    /// SSH keys to authorize on the droplet.
    pub ssh_key_ids: Vec<i32>,
    /// Whether to attach the droplet to the private network.
    pub private_networking: Option<bool>,
    /// Whether to enable automatic backups.
    pub backups_enabled: Option<bool>,
}

impl CreateDropletOptions {
    /// Adds a key to authorize, keeping the first occurrence of duplicates.
    pub fn add_ssh_key_id(&mut self, id: i32) {
        if !self.ssh_key_ids.contains(&id) {
            self.ssh_key_ids.push(id);
        }
    }

    /// Renders the options as query parameters.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.ssh_key_ids.is_empty() {
            let joined = self
                .ssh_key_ids
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("ssh_key_ids", joined));
        }
        if let Some(enabled) = self.private_networking {
            params.push(("private_networking", enabled.to_string()));
        }
        if let Some(enabled) = self.backups_enabled {
            params.push(("backups_enabled", enabled.to_string()));
        }
        params
    }
}

/// Request to create a droplet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewDroplet {
    /// Hostname of the droplet.
    pub name: String,
    /// Image to boot from.
    pub image_id: i32,
    /// Size (hardware profile) to allocate.
    pub size_id: i32,
    /// Region to place the droplet in.
    pub region_id: i32,
    /// Provider-specific extras.
    pub options: CreateDropletOptions,
}

/// A mutation performed on an existing droplet. Each returns an event id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DropletAction {
    /// Graceful reboot.
    Reboot,
    /// Hard power cycle.
    PowerCycle,
    /// Graceful shutdown.
    Shutdown,
    /// Hard power off.
    PowerOff,
    /// Power on.
    PowerOn,
    /// Reset the root password.
    ResetPassword,
    /// Move to another size.
    Resize {
        /// Target size.
        size_id: i32,
    },
    /// Snapshot the droplet into a new image.
    Snapshot {
        /// Image name; the provider picks one when absent.
        name: Option<String>,
    },
    /// Restore from an image, keeping the droplet id.
    Restore {
        /// Image to restore from.
        image_id: i32,
    },
    /// Reinstall from an image.
    Rebuild {
        /// Image to rebuild from.
        image_id: i32,
    },
    /// Change the hostname.
    Rename {
        /// New hostname.
        name: String,
    },
    /// Destroy the droplet.
    Destroy {
        /// Whether the disk is wiped before release.
        scrub_data: bool,
    },
}

impl DropletAction {
    /// Path segment appended to `/droplets/{id}`.
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::PowerCycle => "power_cycle",
            Self::Shutdown => "shutdown",
            Self::PowerOff => "power_off",
            Self::PowerOn => "power_on",
            Self::ResetPassword => "password_reset",
            Self::Resize { .. } => "resize",
            Self::Snapshot { .. } => "snapshot",
            Self::Restore { .. } => "restore",
            Self::Rebuild { .. } => "rebuild",
            Self::Rename { .. } => "rename",
            Self::Destroy { .. } => "destroy",
        }
    }

    /// Extra query parameters carried by the action.
    #[must_use]
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Resize { size_id } => vec![("size_id", size_id.to_string())],
            Self::Snapshot { name: Some(name) } | Self::Rename { name } => {
                vec![("name", name.clone())]
            }
            Self::Restore { image_id } | Self::Rebuild { image_id } => {
                vec![("image_id", image_id.to_string())]
            }
            Self::Destroy { scrub_data } => vec![("scrub_data", scrub_data.to_string())],
            Self::Reboot
            | Self::PowerCycle
            | Self::Shutdown
            | Self::PowerOff
            | Self::PowerOn
            | Self::ResetPassword
            | Self::Snapshot { name: None } => Vec::new(),
        }
    }
}

/// Typed access to the DigitalOcean v1 endpoints.
///
/// Implementations apply the envelope rules from [`crate::api::envelope`]:
/// single-item lookups yield `None` on 404, every other failure surfaces as a
/// [`crate::DigitalOceanError`]. Implementations must be safe to share across
/// tasks.
pub trait DigitalOceanTransport: Send + Sync {
    /// Lists every droplet on the account.
    fn list_droplets(&self) -> TransportFuture<'_, Vec<Droplet>>;

    /// Fetches a droplet, yielding `None` when it does not exist.
    fn get_droplet(&self, id: i32) -> TransportFuture<'_, Option<Droplet>>;

    /// Requests a new droplet. The returned event tracks the build.
    fn create_droplet<'a>(&'a self, request: &'a NewDroplet)
    -> TransportFuture<'a, DropletCreation>;

    /// Performs a mutation on a droplet and returns the tracking event id.
    fn perform_droplet_action<'a>(
        &'a self,
        id: i32,
        action: &'a DropletAction,
    ) -> TransportFuture<'a, i32>;

    /// Lists every image visible to the account.
    fn list_images(&self) -> TransportFuture<'_, Vec<Image>>;

    /// Fetches an image, yielding `None` when it does not exist.
    fn get_image(&self, id: i32) -> TransportFuture<'_, Option<Image>>;

    /// Deletes an image.
    fn delete_image(&self, id: i32) -> TransportFuture<'_, ()>;

    /// Copies an image to another region and returns the tracking event id.
    fn transfer_image(&self, id: i32, region_id: i32) -> TransportFuture<'_, i32>;

    /// Lists the available sizes.
    fn list_sizes(&self) -> TransportFuture<'_, Vec<Size>>;

    /// Lists the available regions.
    fn list_regions(&self) -> TransportFuture<'_, Vec<Region>>;

    /// Lists the SSH keys registered on the account.
    fn list_keys(&self) -> TransportFuture<'_, Vec<SshKey>>;

    /// Fetches a key, yielding `None` when it does not exist.
    fn get_key(&self, id: i32) -> TransportFuture<'_, Option<SshKey>>;

    /// Registers a public key given as an OpenSSH key line.
    fn create_key<'a>(&'a self, name: &'a str, public_key: &'a str)
    -> TransportFuture<'a, SshKey>;

    /// Replaces the public key stored under an existing key id.
    fn edit_key<'a>(&'a self, id: i32, public_key: &'a str) -> TransportFuture<'a, SshKey>;

    /// Removes a registered key.
    fn delete_key(&self, id: i32) -> TransportFuture<'_, ()>;

    /// Fetches the current state of an event.
    fn get_event(&self, id: i32) -> TransportFuture<'_, Event>;
}
