//! Synchronous compute workflows over the event-driven v1 API.

use std::sync::Arc;

use tracing::{debug, info};

use super::naming::{NamingConvention, RandomSuffixNaming};
use super::portable::{NodeAndInitialCredentials, NodeMetadata, Template};
use super::transform::Catalog;
use crate::api::{CreateDropletOptions, DigitalOceanTransport, DropletAction, NewDroplet};
use crate::domain::{Droplet, Image, Region, Size};
use crate::error::{DigitalOceanError, Result};
use crate::events::{EventKind, EventPoller, PollPolicies};
use crate::ssh;

/// Parses a portable identifier into a provider id.
pub(crate) fn parse_id(id: &str) -> Option<i32> {
    id.trim().parse().ok()
}

fn require_id(id: &str, what: &str) -> Result<i32> {
    parse_id(id)
        .ok_or_else(|| DigitalOceanError::NoSuchElement(format!("Cannot find {what} with id: {id}")))
}

/// Compute adapter backed by DigitalOcean droplets.
///
/// Mutations that change a droplet's power state wait for the provider event
/// before returning, so a subsequent read observes the new state.
#[derive(Clone)]
pub struct DigitalOceanComputeServiceAdapter {
    transport: Arc<dyn DigitalOceanTransport>,
    poller: EventPoller,
    naming: Arc<dyn NamingConvention>,
}

impl DigitalOceanComputeServiceAdapter {
    /// Creates an adapter that waits on events using `policies`.
    #[must_use]
    pub fn new(transport: Arc<dyn DigitalOceanTransport>, policies: PollPolicies) -> Self {
        Self {
            poller: EventPoller::new(Arc::clone(&transport), policies),
            transport,
            naming: Arc::new(RandomSuffixNaming),
        }
    }

    /// Replaces the naming convention used to recover node groups.
    #[must_use]
    pub fn with_naming(mut self, naming: Arc<dyn NamingConvention>) -> Self {
        self.naming = naming;
        self
    }

    /// Transport shared by the adapter's workflows.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn DigitalOceanTransport> {
        Arc::clone(&self.transport)
    }

    /// Event poller shared by the adapter's workflows.
    #[must_use]
    pub const fn poller(&self) -> &EventPoller {
        &self.poller
    }

    /// Creates a droplet and waits until it is running.
    ///
    /// A public key in the template options is registered under `name`
    /// first and authorized alongside any listed key ids. Credentials are
    /// left unset for downstream resolution.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::KeyFormat`] when the template public key
    /// is not an RSA or DSA OpenSSH line, the poller's errors when the build
    /// fails or times out, [`DigitalOceanError::NoSuchElement`] when the
    /// droplet vanishes before it can be read back, and propagates transport
    /// failures.
    pub async fn create_node_with_group_encoded_into_name(
        &self,
        group: &str,
        name: &str,
        template: &Template,
    ) -> Result<NodeAndInitialCredentials<Droplet>> {
        let mut options = CreateDropletOptions::default();

        if let Some(public_key) = template
            .options
            .public_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        {
            ssh::decode(public_key)?;
            debug!(%name, "creating key pair for node");
            let key = self.transport.create_key(name, public_key).await?;
            debug!(key_id = key.id, "key pair created");
            options.add_ssh_key_id(key.id);
        }
        for id in &template.options.ssh_key_ids {
            options.add_ssh_key_id(*id);
        }
        options.private_networking = template.options.private_networking;
        options.backups_enabled = template.options.backups_enabled;

        let request = NewDroplet {
            name: name.to_owned(),
            image_id: template.image_id,
            size_id: template.hardware_id,
            region_id: template.location_id,
            options,
        };
        let creation = self.transport.create_droplet(&request).await?;
        info!(%group, %name, droplet_id = creation.id, event_id = creation.event_id, "droplet requested");

        self.poller
            .wait_for(creation.event_id, EventKind::NodeRunning)
            .await?;

        // The create response only carries the id; read back the full record.
        let droplet = self
            .transport
            .get_droplet(creation.id)
            .await?
            .ok_or_else(|| {
                DigitalOceanError::NoSuchElement(format!(
                    "Cannot find droplet with id: {}",
                    creation.id
                ))
            })?;
        info!(droplet_id = droplet.id, "droplet running");

        Ok(NodeAndInitialCredentials {
            id: droplet.id.to_string(),
            node: droplet,
            credentials: None,
        })
    }

    /// Lists every droplet.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn list_nodes(&self) -> Result<Vec<Droplet>> {
        self.transport.list_droplets().await
    }

    /// Lists the droplets whose portable id is in `ids`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn list_nodes_by_ids<S>(&self, ids: &[S]) -> Result<Vec<Droplet>>
    where
        S: AsRef<str> + Sync,
    {
        let wanted: Vec<i32> = ids.iter().filter_map(|id| parse_id(id.as_ref())).collect();
        Ok(self
            .list_nodes()
            .await?
            .into_iter()
            .filter(|droplet| wanted.contains(&droplet.id))
            .collect())
    }

    /// Lists every image visible to the account.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn list_images(&self) -> Result<Vec<Image>> {
        self.transport.list_images().await
    }

    /// Lists the available sizes.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn list_hardware_profiles(&self) -> Result<Vec<Size>> {
        self.transport.list_sizes().await
    }

    /// Lists the available regions.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn list_locations(&self) -> Result<Vec<Region>> {
        self.transport.list_regions().await
    }

    /// Fetches a droplet; `None` when it does not exist or `id` is not numeric.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn get_node(&self, id: &str) -> Result<Option<Droplet>> {
        match parse_id(id) {
            Some(id) => self.transport.get_droplet(id).await,
            None => Ok(None),
        }
    }

    /// Fetches an image; `None` when it does not exist or `id` is not numeric.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        match parse_id(id) {
            Some(id) => self.transport.get_image(id).await,
            None => Ok(None),
        }
    }

    /// Destroys a droplet, scrubbing its disk, without waiting for teardown.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::NoSuchElement`] when `id` is not numeric
    /// and propagates transport failures.
    pub async fn destroy_node(&self, id: &str) -> Result<()> {
        let droplet_id = require_id(id, "droplet")?;
        // TODO: return the destroy event id so callers can wait for NodeTerminated.
        let event_id = self
            .transport
            .perform_droplet_action(droplet_id, &DropletAction::Destroy { scrub_data: true })
            .await?;
        info!(droplet_id, event_id, "droplet destroy requested");
        Ok(())
    }

    /// Reboots a droplet and waits until it is running again.
    ///
    /// # Errors
    ///
    /// See [`Self::suspend_node`].
    pub async fn reboot_node(&self, id: &str) -> Result<()> {
        self.act_and_wait(id, &DropletAction::Reboot, EventKind::NodeRunning)
            .await
    }

    /// Powers a droplet on and waits until it is running.
    ///
    /// # Errors
    ///
    /// See [`Self::suspend_node`].
    pub async fn resume_node(&self, id: &str) -> Result<()> {
        self.act_and_wait(id, &DropletAction::PowerOn, EventKind::NodeRunning)
            .await
    }

    /// Powers a droplet off and waits until it is off.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::NoSuchElement`] when `id` is not numeric,
    /// the poller's errors when the event fails or times out, and propagates
    /// transport failures.
    pub async fn suspend_node(&self, id: &str) -> Result<()> {
        self.act_and_wait(id, &DropletAction::PowerOff, EventKind::NodeSuspended)
            .await
    }

    async fn act_and_wait(&self, id: &str, action: &DropletAction, kind: EventKind) -> Result<()> {
        let droplet_id = require_id(id, "droplet")?;
        let event_id = self
            .transport
            .perform_droplet_action(droplet_id, action)
            .await?;
        debug!(droplet_id, event_id, action = action.path_segment(), "droplet action requested");
        self.poller.wait_for(event_id, kind).await
    }

    /// Lists every droplet as portable node metadata.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn describe_nodes(&self) -> Result<Vec<NodeMetadata>> {
        let (droplets, images, sizes, regions) = tokio::try_join!(
            self.transport.list_droplets(),
            self.transport.list_images(),
            self.transport.list_sizes(),
            self.transport.list_regions(),
        )?;
        let catalog = Catalog {
            images,
            sizes,
            regions,
        };
        Ok(droplets
            .iter()
            .map(|droplet| catalog.to_node(droplet, self.naming.as_ref()))
            .collect())
    }
}
