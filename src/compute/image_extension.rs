//! Capturing droplets as reusable images.

use std::sync::Arc;

use tracing::{info, warn};

use super::adapter::{DigitalOceanComputeServiceAdapter, parse_id};
use super::portable::{CloneImageTemplate, Image};
use super::transform::to_image;
use crate::api::{DigitalOceanTransport, DropletAction};
use crate::error::{DigitalOceanError, Result};
use crate::events::{EventKind, EventPoller};

/// Image operations layered on the compute adapter.
#[derive(Clone)]
pub struct DigitalOceanImageExtension {
    transport: Arc<dyn DigitalOceanTransport>,
    poller: EventPoller,
}

impl DigitalOceanImageExtension {
    /// Creates an extension sharing the adapter's transport and poller.
    #[must_use]
    pub fn new(adapter: &DigitalOceanComputeServiceAdapter) -> Self {
        Self {
            transport: adapter.transport(),
            poller: adapter.poller().clone(),
        }
    }

    /// Validates that node `id` exists and returns a clone template for it.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::NoSuchElement`] when `id` is not numeric
    /// or no droplet has that id, and propagates transport failures.
    pub async fn build_image_template_from_node(
        &self,
        name: &str,
        id: &str,
    ) -> Result<CloneImageTemplate> {
        let missing = || DigitalOceanError::NoSuchElement(format!("Cannot find droplet with id: {id}"));
        let droplet_id = parse_id(id).ok_or_else(missing)?;
        self.transport
            .get_droplet(droplet_id)
            .await?
            .ok_or_else(missing)?;
        Ok(CloneImageTemplate {
            name: name.to_owned(),
            source_node_id: id.to_owned(),
        })
    }

    /// Powers the source droplet off, snapshots it, and returns the new image.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::NoSuchElement`] when the source id is not
    /// numeric or the snapshot does not appear in the image list, the
    /// poller's errors when either event fails or times out, and propagates
    /// transport failures.
    pub async fn create_image(&self, template: &CloneImageTemplate) -> Result<Image> {
        let droplet_id = parse_id(&template.source_node_id).ok_or_else(|| {
            DigitalOceanError::NoSuchElement(format!(
                "Cannot find droplet with id: {}",
                template.source_node_id
            ))
        })?;

        let power_off = self
            .transport
            .perform_droplet_action(droplet_id, &DropletAction::PowerOff)
            .await?;
        self.poller
            .wait_for(power_off, EventKind::NodeSuspended)
            .await?;

        let snapshot = DropletAction::Snapshot {
            name: Some(template.name.clone()),
        };
        let snapshot_event = self
            .transport
            .perform_droplet_action(droplet_id, &snapshot)
            .await?;
        info!(
            droplet_id,
            event_id = snapshot_event,
            name = %template.name,
            "registered new image, waiting for it to become available"
        );
        self.poller
            .wait_for(snapshot_event, EventKind::ImageAvailable)
            .await?;

        // The snapshot call does not return the image id; find it by name.
        let images = self.transport.list_images().await?;
        let image = images
            .iter()
            .find(|image| image.name == template.name)
            .ok_or_else(|| {
                DigitalOceanError::NoSuchElement(format!(
                    "Cannot find image with name: {}",
                    template.name
                ))
            })?;
        Ok(to_image(image))
    }

    /// Clones node `id` into an image called `name`.
    ///
    /// # Errors
    ///
    /// See [`Self::build_image_template_from_node`] and [`Self::create_image`].
    pub async fn create_image_from_node(&self, name: &str, id: &str) -> Result<Image> {
        let template = self.build_image_template_from_node(name, id).await?;
        self.create_image(&template).await
    }

    /// Deletes an image, reporting success instead of raising.
    pub async fn delete_image(&self, id: &str) -> bool {
        let Some(image_id) = parse_id(id) else {
            warn!(%id, "image id is not numeric; nothing deleted");
            return false;
        };
        match self.transport.delete_image(image_id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(image_id, error = %err, "image deletion failed");
                false
            }
        }
    }
}
