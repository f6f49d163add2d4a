//! Resource lifecycle orchestration.
//!
//! The orchestrator issues one mutating call through a [`Backend`] and, for
//! asynchronous transitions, polls the resource until the provider reports a
//! terminal status or the poll budget runs out. Work is strictly sequential:
//! every poll is a fresh remote query and nothing runs in the background.

mod destroy;
mod error;
mod request;
mod wait;

use tokio::time::Instant;
use tracing::info;

use crate::backend::Backend;
use crate::resource::{Resource, ResourceId, TransitionKind};
use crate::session::Session;

pub use destroy::{DestroyOutcome, DestroyReport, DestroyStatus};
pub use error::LifecycleError;
pub use request::{LifecycleOutcome, LifecycleRequest, ReadyResource, RequestFor};
pub use wait::PollPolicy;

/// Drives resources of one provider through lifecycle transitions.
#[derive(Debug)]
pub struct Orchestrator<'s, B> {
    session: &'s Session<B>,
    ready_policy: PollPolicy,
    archive_policy: PollPolicy,
}

impl<'s, B: Backend> Orchestrator<'s, B> {
    /// Creates an orchestrator using the default poll policies.
    #[must_use]
    pub const fn new(session: &'s Session<B>) -> Self {
        Self {
            session,
            ready_policy: PollPolicy::READY,
            archive_policy: PollPolicy::ARCHIVE,
        }
    }

    /// Overrides the ready-wait policy used after create and rebuild.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_ready_policy(mut self, policy: PollPolicy) -> Self {
        self.ready_policy = policy;
        self
    }

    /// Overrides the archive-wait policy used after destroy.
    #[must_use]
    pub const fn with_archive_policy(mut self, policy: PollPolicy) -> Self {
        self.archive_policy = policy;
        self
    }

    fn ensure_supported(&self, kind: TransitionKind) -> Result<(), LifecycleError<B::Error>> {
        let backend = self.session.backend();
        if backend.supports(kind) {
            return Ok(());
        }
        Err(LifecycleError::Unsupported {
            provider: backend.provider_name(),
            operation: kind,
        })
    }

    /// Dispatches a request to the matching transition.
    ///
    /// # Errors
    ///
    /// Returns the error of the selected transition.
    pub async fn execute(
        &self,
        request: &RequestFor<B>,
    ) -> Result<LifecycleOutcome, LifecycleError<B::Error>> {
        match request {
            LifecycleRequest::Create(spec) => self.create(spec).await.map(LifecycleOutcome::Ready),
            LifecycleRequest::Destroy(ids) => {
                self.destroy(ids).await.map(LifecycleOutcome::Destroyed)
            }
            LifecycleRequest::Rebuild { id, image_id } => self
                .rebuild(*id, *image_id)
                .await
                .map(LifecycleOutcome::Ready),
            LifecycleRequest::Shutdown(id) => {
                self.shutdown(*id).await.map(LifecycleOutcome::Snapshot)
            }
            LifecycleRequest::Start { id, plan_id } => self
                .start(*id, *plan_id)
                .await
                .map(LifecycleOutcome::Snapshot),
            LifecycleRequest::Freeze(id) => self.freeze(*id).await.map(LifecycleOutcome::Snapshot),
            LifecycleRequest::Thaw { id, plan_id } => self
                .thaw(*id, *plan_id)
                .await
                .map(LifecycleOutcome::Snapshot),
            LifecycleRequest::Clone { id, options } => self
                .clone_resource(*id, options)
                .await
                .map(LifecycleOutcome::Snapshot),
        }
    }

    /// Provisions a resource and waits until it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Remote`] when the create or a status call
    /// fails and [`LifecycleError::Timeout`] when the resource never becomes
    /// ready.
    pub async fn create(
        &self,
        spec: &B::CreateSpec,
    ) -> Result<ReadyResource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Create)?;
        let started = Instant::now();
        let created = self
            .session
            .backend()
            .create_resource(spec)
            .await
            .map_err(|source| LifecycleError::Remote {
                operation: "create",
                id: None,
                source,
            })?;
        info!(resource_id = %created.id, name = %created.name, "created resource");

        let ready = self.wait_until_ready(created.id, started).await?;
        info!(
            resource_id = %ready.resource.id,
            ip = ready.resource.public_ip.as_deref().unwrap_or("-"),
            total_secs = format_args!("{:.1}", ready.elapsed.as_secs_f64()),
            "resource ready"
        );
        Ok(ready)
    }

    /// Rebuilds a resource from an image and waits until it is ready again.
    ///
    /// # Errors
    ///
    /// Same as [`Orchestrator::create`].
    pub async fn rebuild(
        &self,
        id: ResourceId,
        image_id: u64,
    ) -> Result<ReadyResource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Rebuild)?;
        let started = Instant::now();
        self.session
            .backend()
            .rebuild_resource(id, image_id)
            .await
            .map_err(|err| LifecycleError::remote("rebuild", id, err))?;
        info!(resource_id = %id, image_id, "rebuilding resource");

        self.wait_until_ready(id, started).await
    }

    /// Powers a resource off.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Remote`] when the provider call fails.
    pub async fn shutdown(&self, id: ResourceId) -> Result<Resource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Shutdown)?;
        let resource = self
            .session
            .backend()
            .shutdown_resource(id)
            .await
            .map_err(|err| LifecycleError::remote("shutdown", id, err))?;
        info!(resource_id = %id, "stopped resource");
        Ok(resource)
    }

    /// Powers a resource on with the given plan.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Remote`] when the provider call fails.
    pub async fn start(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> Result<Resource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Start)?;
        let resource = self
            .session
            .backend()
            .start_resource(id, plan_id)
            .await
            .map_err(|err| LifecycleError::remote("start", id, err))?;
        info!(resource_id = %id, plan_id, "started resource");
        Ok(resource)
    }

    /// Freezes a resource that is not running.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Precondition`] without calling freeze when
    /// the resource is running, and [`LifecycleError::Remote`] when the
    /// lookup or the freeze call fails.
    pub async fn freeze(&self, id: ResourceId) -> Result<Resource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Freeze)?;
        let backend = self.session.backend();
        let current = backend
            .get_resource(id)
            .await
            .map_err(|err| LifecycleError::remote("status", id, err))?;
        if current.flags.running {
            return Err(LifecycleError::Precondition {
                operation: TransitionKind::Freeze,
                id,
                reason: String::from("resource must not be running"),
            });
        }

        let resource = backend
            .freeze_resource(id)
            .await
            .map_err(|err| LifecycleError::remote("freeze", id, err))?;
        info!(resource_id = %id, "froze resource");
        Ok(resource)
    }

    /// Thaws a frozen resource onto a plan.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Remote`] when the provider call fails.
    pub async fn thaw(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> Result<Resource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Thaw)?;
        let resource = self
            .session
            .backend()
            .thaw_resource(id, plan_id)
            .await
            .map_err(|err| LifecycleError::remote("thaw", id, err))?;
        info!(resource_id = %id, plan_id, "thawed resource");
        Ok(resource)
    }

    /// Clones a resource that is not frozen.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Precondition`] without calling clone when
    /// the source is frozen, and [`LifecycleError::Remote`] when the lookup
    /// or the clone call fails.
    pub async fn clone_resource(
        &self,
        id: ResourceId,
        options: &B::CloneSpec,
    ) -> Result<Resource, LifecycleError<B::Error>> {
        self.ensure_supported(TransitionKind::Clone)?;
        let backend = self.session.backend();
        let current = backend
            .get_resource(id)
            .await
            .map_err(|err| LifecycleError::remote("status", id, err))?;
        if current.flags.frozen {
            return Err(LifecycleError::Precondition {
                operation: TransitionKind::Clone,
                id,
                reason: String::from("resource must not be frozen"),
            });
        }

        let resource = backend
            .clone_resource(id, options)
            .await
            .map_err(|err| LifecycleError::remote("clone", id, err))?;
        info!(resource_id = %id, clone_id = %resource.id, "cloned resource");
        Ok(resource)
    }
}

#[cfg(test)]
mod tests;
