//! HTTP client for the DigitalOcean v1 API.
//!
//! Every endpoint is a `GET` authenticated by `client_id` and `api_key` query
//! parameters. Responses share an envelope whose `status` field is `OK` or
//! `ERROR`; errors carry an `error_message`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::resource::ReferenceKind;

use super::error::DigitalOceanError;
use super::types::{
    Catalogue, CatalogueEntry, Droplet, DropletList, DropletSpec, EventAck, SingleDroplet,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const NO_QUERY: &[(&str, &str)] = &[];

/// Thin typed wrapper over the DigitalOcean v1 endpoints.
#[derive(Clone, Debug)]
pub struct DigitalOceanClient {
    http: Client,
    base: String,
    client_id: String,
    api_key: String,
}

impl DigitalOceanClient {
    /// Builds a client for `base` (for example `https://api.digitalocean.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::Http`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        base: &str,
        client_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, DigitalOceanError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_owned(),
            client_id: client_id.into(),
            api_key: api_key.into(),
        })
    }

    async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T, DigitalOceanError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        debug!(path, "DigitalOcean request");
        let response = self
            .http
            .get(format!("{}/{path}", self.base))
            .query(&[("client_id", &self.client_id), ("api_key", &self.api_key)])
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(DigitalOceanError::NotFound(path.to_owned()));
        }
        match decode(&body) {
            Err(DigitalOceanError::Decode(_)) if !status.is_success() => Err(
                DigitalOceanError::Api(format!("unexpected HTTP status {status}")),
            ),
            other => other,
        }
    }

    /// Lists every droplet of the account.
    ///
    /// # Errors
    ///
    /// Returns a [`DigitalOceanError`] when the request or decoding fails.
    pub async fn droplets(&self) -> Result<Vec<Droplet>, DigitalOceanError> {
        let list: DropletList = self.get("droplets/", NO_QUERY).await?;
        Ok(list.droplets)
    }

    /// Fetches one droplet.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::NotFound`] for unknown ids.
    pub async fn droplet(&self, id: u64) -> Result<Droplet, DigitalOceanError> {
        let single: SingleDroplet = self.get(&format!("droplets/{id}"), NO_QUERY).await?;
        Ok(single.droplet)
    }

    /// Requests a new droplet. The returned droplet is partial.
    ///
    /// # Errors
    ///
    /// Returns a [`DigitalOceanError`] when the API rejects the request.
    pub async fn create_droplet(&self, spec: &DropletSpec) -> Result<Droplet, DigitalOceanError> {
        let single: SingleDroplet = self.get("droplets/new", spec).await?;
        Ok(single.droplet)
    }

    /// Queues destruction of a droplet.
    ///
    /// # Errors
    ///
    /// Returns a [`DigitalOceanError`] when the API rejects the request.
    pub async fn destroy_droplet(&self, id: u64) -> Result<EventAck, DigitalOceanError> {
        self.get(&format!("droplets/{id}/destroy"), NO_QUERY).await
    }

    /// Queues a reinstall of a droplet from `image_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`DigitalOceanError`] when the API rejects the request.
    pub async fn rebuild_droplet(
        &self,
        id: u64,
        image_id: u64,
    ) -> Result<EventAck, DigitalOceanError> {
        self.get(&format!("droplets/{id}/rebuild"), &[("image_id", image_id)]).await
    }

    /// Renames a droplet.
    ///
    /// # Errors
    ///
    /// Returns a [`DigitalOceanError`] when the API rejects the request.
    pub async fn rename_droplet(&self, id: u64, name: &str) -> Result<EventAck, DigitalOceanError> {
        self.get(&format!("droplets/{id}/rename"), &[("name", name)]).await
    }

    /// Queues a graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns a [`DigitalOceanError`] when the API rejects the request.
    pub async fn shutdown_droplet(&self, id: u64) -> Result<EventAck, DigitalOceanError> {
        self.get(&format!("droplets/{id}/shutdown"), NO_QUERY).await
    }

    /// Lists the region, size, or image catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`DigitalOceanError::Unsupported`] for catalogues DigitalOcean
    /// does not serve.
    pub async fn catalogue(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<CatalogueEntry>, DigitalOceanError> {
        let path = match kind {
            ReferenceKind::Region => "regions/",
            ReferenceKind::Size => "sizes/",
            ReferenceKind::Image => "images/",
            ReferenceKind::Plan | ReferenceKind::Distribution => {
                return Err(DigitalOceanError::Unsupported(kind.as_str()));
            }
        };
        let catalogue: Catalogue = self.get(path, NO_QUERY).await?;
        Ok(catalogue.entries)
    }
}

/// Decodes an API envelope, turning `status: ERROR` into an error.
pub(super) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, DigitalOceanError> {
    let value: Value = serde_json::from_str(body)?;
    if value.get("status").and_then(Value::as_str) == Some("OK") {
        return Ok(serde_json::from_value(value)?);
    }

    let message = value
        .get("error_message")
        .and_then(Value::as_str)
        .unwrap_or("request failed without an error message")
        .to_owned();
    if message.to_ascii_lowercase().contains("not found") {
        Err(DigitalOceanError::NotFound(message))
    } else {
        Err(DigitalOceanError::Api(message))
    }
}
