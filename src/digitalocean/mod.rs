//! DigitalOcean backend: droplets on the v1 API.

mod api;
mod error;
mod types;

use crate::backend::{Backend, BackendFuture};
use crate::config::{ConfigError, DigitalOceanConfig};
use crate::resource::{
    ReferenceEntry, ReferenceKind, Resource, ResourceId, ResourceStatus, TransitionKind, WaitGoal,
};
use crate::session::Session;

pub use api::DigitalOceanClient;
pub use error::DigitalOceanError;
pub use types::{CatalogueEntry, Droplet, DropletSpec, EventAck};

/// Flag values that override the configured droplet defaults.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DropletOverrides {
    /// Region identifier.
    pub region_id: Option<u64>,
    /// Size identifier.
    pub size_id: Option<u64>,
    /// Image identifier.
    pub image_id: Option<u64>,
    /// SSH key identifier.
    pub ssh_key_id: Option<u64>,
}

/// Backend that manages droplets through the DigitalOcean v1 API.
#[derive(Clone, Debug)]
pub struct DigitalOceanBackend {
    client: DigitalOceanClient,
    config: DigitalOceanConfig,
}

impl DigitalOceanBackend {
    /// Constructs a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] when credentials are absent and
    /// [`ConfigError::HttpClient`] when the HTTP client cannot be built.
    pub fn new(config: DigitalOceanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = DigitalOceanClient::new(
            &config.api_base,
            config.client_id.clone().unwrap_or_default(),
            config.api_key.clone().unwrap_or_default(),
        )
        .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// Borrows the underlying API client for droplet operations outside the
    /// lifecycle, such as rename.
    #[must_use]
    pub const fn client(&self) -> &DigitalOceanClient {
        &self.client
    }

    /// Builds a create spec, filling unset fields from the configured defaults.
    #[must_use]
    pub fn droplet_spec(
        &self,
        name: impl Into<String>,
        overrides: DropletOverrides,
    ) -> DropletSpec {
        DropletSpec {
            name: name.into(),
            size_id: overrides.size_id.unwrap_or(self.config.default_size_id),
            image_id: overrides.image_id.unwrap_or(self.config.default_image_id),
            region_id: overrides.region_id.unwrap_or(self.config.default_region_id),
            ssh_key_id: overrides.ssh_key_id.or(self.config.default_ssh_key),
        }
    }
}

impl Session<DigitalOceanBackend> {
    /// Loads DigitalOcean configuration from files and the environment and
    /// builds a session.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] listing every missing credential.
    pub fn resolve() -> Result<Self, ConfigError> {
        let config = DigitalOceanConfig::load_without_cli_args()?;
        Ok(Self::new(DigitalOceanBackend::new(config)?))
    }
}

impl Backend for DigitalOceanBackend {
    type Error = DigitalOceanError;
    type CreateSpec = DropletSpec;
    type CloneSpec = ();

    fn provider_name(&self) -> &'static str {
        "digitalocean"
    }

    fn supports(&self, kind: TransitionKind) -> bool {
        matches!(
            kind,
            TransitionKind::Create
                | TransitionKind::Destroy
                | TransitionKind::Rebuild
                | TransitionKind::Shutdown
        )
    }

    fn is_terminal(&self, status: &ResourceStatus, goal: WaitGoal) -> bool {
        match goal {
            WaitGoal::Ready => status.as_str() == types::STATUS_ACTIVE,
            WaitGoal::Archived => matches!(status.as_str(), "archive" | "off"),
        }
    }

    fn list_resources(&self) -> BackendFuture<'_, Vec<Resource>, Self::Error> {
        Box::pin(async move {
            let droplets = self.client.droplets().await?;
            Ok(droplets.into_iter().map(Resource::from).collect())
        })
    }

    fn get_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.droplet(id.get()).await?.into()) })
    }

    fn list_reference_data(
        &self,
        kind: ReferenceKind,
    ) -> BackendFuture<'_, Vec<ReferenceEntry>, Self::Error> {
        Box::pin(async move {
            let entries = self.client.catalogue(kind).await?;
            Ok(entries.into_iter().map(ReferenceEntry::from).collect())
        })
    }

    fn create_resource<'a>(
        &'a self,
        spec: &'a Self::CreateSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(async move {
            let mut droplet = self.client.create_droplet(spec).await?;
            if droplet.region_id == 0 {
                droplet.region_id = spec.region_id;
            }
            Ok(droplet.into())
        })
    }

    fn destroy_resource(&self, id: ResourceId) -> BackendFuture<'_, (), Self::Error> {
        Box::pin(async move {
            self.client.destroy_droplet(id.get()).await?;
            Ok(())
        })
    }

    fn rebuild_resource(
        &self,
        id: ResourceId,
        image_id: u64,
    ) -> BackendFuture<'_, (), Self::Error> {
        Box::pin(async move {
            self.client.rebuild_droplet(id.get(), image_id).await?;
            Ok(())
        })
    }

    fn shutdown_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move {
            self.client.shutdown_droplet(id.get()).await?;
            Ok(self.client.droplet(id.get()).await?.into())
        })
    }
}
