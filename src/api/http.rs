//! `reqwest` implementation of [`DigitalOceanTransport`].

use serde::de::DeserializeOwned;
use tracing::debug;

use super::envelope::{self, NotFoundPolicy};
use super::transport::{DigitalOceanTransport, DropletAction, NewDroplet, TransportFuture};
use crate::config::DigitalOceanConfig;
use crate::domain::{Droplet, DropletCreation, Event, Image, Region, Size, SshKey};
use crate::error::{DigitalOceanError, Result};

type Query = Vec<(&'static str, String)>;

/// Transport that talks to the v1 REST API over HTTPS.
///
/// Every call is a `GET` carrying `client_id` and `api_key` as query
/// parameters. The client is cheap to clone and safe to share.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    api_key: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Builds a transport from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::Configuration`] when the configuration is
    /// invalid and [`DigitalOceanError::Transport`] when the HTTP client
    /// cannot be constructed.
    pub fn new(config: &DigitalOceanConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_owned(),
            client_id: config.client_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn send(&self, path: &str, query: &[(&'static str, String)]) -> Result<(u16, Vec<u8>)> {
        debug!(path, "digitalocean request");
        let response = self
            .client
            .get(format!("{}{path}", self.endpoint))
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .query(query)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(path, status, bytes = body.len(), "digitalocean response");
        Ok((status, body.to_vec()))
    }

    async fn fetch<T>(
        &self,
        path: &str,
        query: Query,
        field: &str,
        not_found: NotFoundPolicy,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.send(path, &query).await?;
        envelope::interpret(status, Some(body.as_slice()), field, not_found)
    }

    async fn fetch_list<T>(&self, path: &str, field: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self
            .fetch(path, Vec::new(), field, NotFoundPolicy::Raise)
            .await?
            .unwrap_or_default())
    }

    async fn fetch_required<T>(&self, path: &str, query: Query, field: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.fetch(path, query, field, NotFoundPolicy::Raise)
            .await?
            .ok_or_else(|| {
                DigitalOceanError::Transport(format!("empty response from {path}"))
            })
    }

    async fn fetch_unit(&self, path: &str) -> Result<()> {
        let (status, body) = self.send(path, &[]).await?;
        envelope::interpret_unit(status, Some(body.as_slice()))
    }
}

impl DigitalOceanTransport for HttpTransport {
    fn list_droplets(&self) -> TransportFuture<'_, Vec<Droplet>> {
        Box::pin(async move { self.fetch_list("/droplets", "droplets").await })
    }

    fn get_droplet(&self, id: i32) -> TransportFuture<'_, Option<Droplet>> {
        Box::pin(async move {
            self.fetch(
                &format!("/droplets/{id}"),
                Vec::new(),
                "droplet",
                NotFoundPolicy::Absent,
            )
            .await
        })
    }

    fn create_droplet<'a>(
        &'a self,
        request: &'a NewDroplet,
    ) -> TransportFuture<'a, DropletCreation> {
        Box::pin(async move {
            let mut query = vec![
                ("name", request.name.clone()),
                ("size_id", request.size_id.to_string()),
                ("image_id", request.image_id.to_string()),
                ("region_id", request.region_id.to_string()),
            ];
            query.extend(request.options.query());
            self.fetch_required("/droplets/new", query, "droplet").await
        })
    }

    fn perform_droplet_action<'a>(
        &'a self,
        id: i32,
        action: &'a DropletAction,
    ) -> TransportFuture<'a, i32> {
        Box::pin(async move {
            let path = format!("/droplets/{id}/{}", action.path_segment());
            self.fetch_required(&path, action.query(), "event_id").await
        })
    }

    fn list_images(&self) -> TransportFuture<'_, Vec<Image>> {
        Box::pin(async move { self.fetch_list("/images", "images").await })
    }

    fn get_image(&self, id: i32) -> TransportFuture<'_, Option<Image>> {
        Box::pin(async move {
            self.fetch(
                &format!("/images/{id}"),
                Vec::new(),
                "image",
                NotFoundPolicy::Absent,
            )
            .await
        })
    }

    fn delete_image(&self, id: i32) -> TransportFuture<'_, ()> {
        Box::pin(async move { self.fetch_unit(&format!("/images/{id}/destroy")).await })
    }

    fn transfer_image(&self, id: i32, region_id: i32) -> TransportFuture<'_, i32> {
        Box::pin(async move {
            self.fetch_required(
                &format!("/images/{id}/transfer"),
                vec![("region_id", region_id.to_string())],
                "event_id",
            )
            .await
        })
    }

    fn list_sizes(&self) -> TransportFuture<'_, Vec<Size>> {
        Box::pin(async move { self.fetch_list("/sizes", "sizes").await })
    }

    fn list_regions(&self) -> TransportFuture<'_, Vec<Region>> {
        Box::pin(async move { self.fetch_list("/regions", "regions").await })
    }

    fn list_keys(&self) -> TransportFuture<'_, Vec<SshKey>> {
        Box::pin(async move { self.fetch_list("/ssh_keys", "ssh_keys").await })
    }

    fn get_key(&self, id: i32) -> TransportFuture<'_, Option<SshKey>> {
        Box::pin(async move {
            self.fetch(
                &format!("/ssh_keys/{id}"),
                Vec::new(),
                "ssh_key",
                NotFoundPolicy::Absent,
            )
            .await
        })
    }

    fn create_key<'a>(
        &'a self,
        name: &'a str,
        public_key: &'a str,
    ) -> TransportFuture<'a, SshKey> {
        Box::pin(async move {
            let query = vec![
                ("name", name.to_owned()),
                ("ssh_pub_key", public_key.to_owned()),
            ];
            self.fetch_required("/ssh_keys/new", query, "ssh_key").await
        })
    }

    fn edit_key<'a>(&'a self, id: i32, public_key: &'a str) -> TransportFuture<'a, SshKey> {
        Box::pin(async move {
            self.fetch_required(
                &format!("/ssh_keys/{id}/edit"),
                vec![("ssh_pub_key", public_key.to_owned())],
                "ssh_key",
            )
            .await
        })
    }

    fn delete_key(&self, id: i32) -> TransportFuture<'_, ()> {
        Box::pin(async move { self.fetch_unit(&format!("/ssh_keys/{id}/destroy")).await })
    }

    fn get_event(&self, id: i32) -> TransportFuture<'_, Event> {
        Box::pin(async move {
            self.fetch_required(&format!("/events/{id}"), Vec::new(), "event")
                .await
        })
    }
}
