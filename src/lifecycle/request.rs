//! Typed lifecycle requests and their outcomes.

use std::time::Duration;

use crate::backend::Backend;
use crate::resource::{Resource, ResourceId, TransitionKind};

use super::destroy::DestroyReport;

/// A single requested transition. Exactly one kind per request; every
/// parameter the kind needs is carried by its variant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LifecycleRequest<C, K> {
    /// Provision a resource from a provider specific spec.
    Create(C),
    /// Destroy each listed resource in order.
    Destroy(Vec<ResourceId>),
    /// Reinstall a resource from an image.
    Rebuild {
        /// Resource identifier.
        id: ResourceId,
        /// Image to install.
        image_id: u64,
    },
    /// Power a resource off.
    Shutdown(ResourceId),
    /// Power a resource on with a plan.
    Start {
        /// Resource identifier.
        id: ResourceId,
        /// Plan to start on.
        plan_id: u64,
    },
    /// Freeze a stopped resource.
    Freeze(ResourceId),
    /// Thaw a frozen resource onto a plan.
    Thaw {
        /// Resource identifier.
        id: ResourceId,
        /// Plan to thaw onto.
        plan_id: u64,
    },
    /// Clone a resource.
    Clone {
        /// Source resource identifier.
        id: ResourceId,
        /// Provider specific clone options.
        options: K,
    },
}

/// Request type accepted by an orchestrator over backend `B`.
pub type RequestFor<B> = LifecycleRequest<<B as Backend>::CreateSpec, <B as Backend>::CloneSpec>;

impl<C, K> LifecycleRequest<C, K> {
    /// The transition this request asks for.
    #[must_use]
    pub const fn kind(&self) -> TransitionKind {
        match self {
            Self::Create(_) => TransitionKind::Create,
            Self::Destroy(_) => TransitionKind::Destroy,
            Self::Rebuild { .. } => TransitionKind::Rebuild,
            Self::Shutdown(_) => TransitionKind::Shutdown,
            Self::Start { .. } => TransitionKind::Start,
            Self::Freeze(_) => TransitionKind::Freeze,
            Self::Thaw { .. } => TransitionKind::Thaw,
            Self::Clone { .. } => TransitionKind::Clone,
        }
    }
}

/// Result of a ready-wait: the first snapshot that satisfied the goal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadyResource {
    /// Snapshot observed in the ready state.
    pub resource: Resource,
    /// Number of status polls performed.
    pub polls: u32,
    /// Wall-clock time since the mutating call was issued.
    pub elapsed: Duration,
}

/// Outcome of [`super::Orchestrator::execute`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LifecycleOutcome {
    /// Create or rebuild finished and the resource is ready.
    Ready(ReadyResource),
    /// A destroy batch ran to completion.
    Destroyed(DestroyReport),
    /// A synchronous transition returned this snapshot.
    Snapshot(Resource),
}
