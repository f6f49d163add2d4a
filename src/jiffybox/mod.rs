//! JiffyBox backend: boxes on the v1.0 API.

mod api;
mod error;
mod types;

use crate::backend::{Backend, BackendFuture};
use crate::config::{ConfigError, JiffyBoxConfig};
use crate::resource::{
    Placement, ReferenceEntry, ReferenceKind, Resource, ResourceId, ResourceStatus,
    TransitionKind, WaitGoal,
};
use crate::session::Session;

pub use api::JiffyBoxClient;
pub use error::JiffyBoxError;
pub use types::{
    Backup, BoxSpec, CloneSpec, Distribution, HOURS_PER_MONTH, JiffyBox, Plan, Profile,
};

/// Backend that manages boxes through the JiffyBox API.
#[derive(Clone, Debug)]
pub struct JiffyBoxBackend {
    client: JiffyBoxClient,
    config: JiffyBoxConfig,
}

impl JiffyBoxBackend {
    /// Constructs a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] when the API key is absent and
    /// [`ConfigError::HttpClient`] when the HTTP client cannot be built.
    pub fn new(config: JiffyBoxConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = JiffyBoxClient::new(
            &config.api_base,
            config.api_key.as_deref().unwrap_or_default(),
        )
        .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// Borrows the underlying API client for calls outside the lifecycle,
    /// such as backups and detailed box views.
    #[must_use]
    pub const fn client(&self) -> &JiffyBoxClient {
        &self.client
    }

    /// Plan used when a command does not name one.
    #[must_use]
    pub const fn default_plan_id(&self) -> u64 {
        self.config.default_plan_id
    }

    /// Builds a create spec, filling unset fields from the configured defaults.
    #[must_use]
    pub fn box_spec(
        &self,
        name: impl Into<String>,
        plan_id: Option<u64>,
        distribution: Option<String>,
    ) -> BoxSpec {
        BoxSpec {
            name: name.into(),
            plan_id: plan_id.unwrap_or(self.config.default_plan_id),
            distribution: distribution
                .unwrap_or_else(|| self.config.default_distribution.clone()),
            password: self.config.default_password.clone(),
            use_ssh_key: true,
        }
    }

    /// Builds clone options with the configured password.
    #[must_use]
    pub fn clone_spec(&self, name: impl Into<String>, plan_id: Option<u64>) -> CloneSpec {
        CloneSpec {
            name: name.into(),
            plan_id: plan_id.unwrap_or(self.config.default_plan_id),
            password: self.config.default_password.clone(),
        }
    }
}

impl Session<JiffyBoxBackend> {
    /// Loads JiffyBox configuration from files and the environment and builds
    /// a session.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the API key is missing.
    pub fn resolve() -> Result<Self, ConfigError> {
        let config = JiffyBoxConfig::load_without_cli_args()?;
        Ok(Self::new(JiffyBoxBackend::new(config)?))
    }
}

impl Backend for JiffyBoxBackend {
    type Error = JiffyBoxError;
    type CreateSpec = BoxSpec;
    type CloneSpec = CloneSpec;

    fn provider_name(&self) -> &'static str {
        "jiffybox"
    }

    fn supports(&self, kind: TransitionKind) -> bool {
        !matches!(kind, TransitionKind::Rebuild)
    }

    fn is_terminal(&self, status: &ResourceStatus, goal: WaitGoal) -> bool {
        match goal {
            WaitGoal::Ready => status.as_str() == types::STATUS_READY,
            // a deleted box disappears; the wait loop sees a not-found error
            WaitGoal::Archived => false,
        }
    }

    fn list_resources(&self) -> BackendFuture<'_, Vec<Resource>, Self::Error> {
        Box::pin(async move {
            let boxes = self.client.boxes().await?;
            Ok(boxes.into_iter().map(Resource::from).collect())
        })
    }

    fn get_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.jiffybox(id.get()).await?.into()) })
    }

    fn list_reference_data(
        &self,
        kind: ReferenceKind,
    ) -> BackendFuture<'_, Vec<ReferenceEntry>, Self::Error> {
        Box::pin(async move { self.client.catalogue(kind).await })
    }

    fn create_resource<'a>(
        &'a self,
        spec: &'a Self::CreateSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(async move {
            let mut resource = Resource::from(self.client.create_box(spec).await?);
            if let Placement::Plan { distribution, .. } = &mut resource.placement {
                *distribution = Some(spec.distribution.clone());
            }
            Ok(resource)
        })
    }

    fn destroy_resource(&self, id: ResourceId) -> BackendFuture<'_, (), Self::Error> {
        Box::pin(async move { self.client.delete_box(id.get()).await })
    }

    fn shutdown_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.shutdown_box(id.get()).await?.into()) })
    }

    fn start_resource(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.start_box(id.get(), plan_id).await?.into()) })
    }

    fn freeze_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.freeze_box(id.get()).await?.into()) })
    }

    fn thaw_resource(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> BackendFuture<'_, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.thaw_box(id.get(), plan_id).await?.into()) })
    }

    fn clone_resource<'a>(
        &'a self,
        id: ResourceId,
        options: &'a Self::CloneSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(async move { Ok(self.client.clone_box(id.get(), options).await?.into()) })
    }
}
