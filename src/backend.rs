//! Backend abstraction over the cloud providers driven by the orchestrator.
//!
//! Each provider client implements [`Backend`]; the lifecycle orchestrator is
//! written once against this trait. Transitions a provider does not offer keep
//! the default implementations, which fail with the provider's
//! `unsupported` error, and report `false` from [`Backend::supports`].

use std::future::{self, Future};
use std::pin::Pin;

use crate::resource::{
    ReferenceEntry, ReferenceKind, Resource, ResourceId, ResourceStatus, TransitionKind, WaitGoal,
};

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Behaviour shared by provider error types.
pub trait ApiError: std::error::Error + Send + Sync + 'static {
    /// Returns true when the provider reported that the resource does not
    /// exist.
    fn is_not_found(&self) -> bool;

    /// Builds the error returned for operations the provider does not offer.
    fn unsupported(operation: &'static str) -> Self;
}

/// Capability interface implemented by provider backends.
pub trait Backend {
    /// Provider specific error type.
    type Error: ApiError;
    /// Parameters accepted by [`Backend::create_resource`].
    type CreateSpec: Send + Sync;
    /// Parameters accepted by [`Backend::clone_resource`].
    type CloneSpec: Send + Sync;

    /// Short provider name used in logs.
    fn provider_name(&self) -> &'static str;

    /// Returns true when the provider offers the given transition.
    fn supports(&self, kind: TransitionKind) -> bool;

    /// Returns true when `status` satisfies `goal` for this provider.
    fn is_terminal(&self, status: &ResourceStatus, goal: WaitGoal) -> bool;

    /// Lists every resource visible to the account.
    fn list_resources(&self) -> BackendFuture<'_, Vec<Resource>, Self::Error>;

    /// Fetches a single resource. Fails with a not-found error for unknown ids.
    fn get_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error>;

    /// Lists a reference-data catalogue.
    fn list_reference_data(
        &self,
        kind: ReferenceKind,
    ) -> BackendFuture<'_, Vec<ReferenceEntry>, Self::Error>;

    /// Provisions a new resource.
    fn create_resource<'a>(
        &'a self,
        spec: &'a Self::CreateSpec,
    ) -> BackendFuture<'a, Resource, Self::Error>;

    /// Issues the destroy call. Completion is observed by polling.
    fn destroy_resource(&self, id: ResourceId) -> BackendFuture<'_, (), Self::Error>;

    /// Reinstalls a resource from an image.
    fn rebuild_resource(
        &self,
        id: ResourceId,
        image_id: u64,
    ) -> BackendFuture<'_, (), Self::Error> {
        let _ = (id, image_id);
        unsupported(TransitionKind::Rebuild)
    }

    /// Powers a resource off.
    fn shutdown_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        let _ = id;
        unsupported(TransitionKind::Shutdown)
    }

    /// Powers a resource on using the given plan.
    fn start_resource(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> BackendFuture<'_, Resource, Self::Error> {
        let _ = (id, plan_id);
        unsupported(TransitionKind::Start)
    }

    /// Freezes a stopped resource.
    fn freeze_resource(&self, id: ResourceId) -> BackendFuture<'_, Resource, Self::Error> {
        let _ = id;
        unsupported(TransitionKind::Freeze)
    }

    /// Thaws a frozen resource onto a plan.
    fn thaw_resource(
        &self,
        id: ResourceId,
        plan_id: u64,
    ) -> BackendFuture<'_, Resource, Self::Error> {
        let _ = (id, plan_id);
        unsupported(TransitionKind::Thaw)
    }

    /// Clones a resource.
    fn clone_resource<'a>(
        &'a self,
        id: ResourceId,
        options: &'a Self::CloneSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        let _ = (id, options);
        unsupported(TransitionKind::Clone)
    }
}

fn unsupported<'a, T: Send + 'a, E: ApiError>(kind: TransitionKind) -> BackendFuture<'a, T, E> {
    Box::pin(future::ready(Err(E::unsupported(kind.as_str()))))
}
