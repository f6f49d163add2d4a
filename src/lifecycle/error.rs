//! Error types for lifecycle transitions.

use thiserror::Error;

use crate::resource::{ResourceId, TransitionKind, WaitGoal};

/// Errors surfaced while driving a resource through a transition.
#[derive(Debug, Error)]
pub enum LifecycleError<E>
where
    E: std::error::Error + 'static,
{
    /// The transition is not valid for the resource's current state. No
    /// mutating call was issued.
    #[error("cannot {operation} resource {id}: {reason}")]
    Precondition {
        /// Transition that was rejected.
        operation: TransitionKind,
        /// Resource identifier.
        id: ResourceId,
        /// Human-readable reason.
        reason: String,
    },
    /// The provider does not offer the transition.
    #[error("{provider} does not support {operation}")]
    Unsupported {
        /// Provider name.
        provider: &'static str,
        /// Requested transition.
        operation: TransitionKind,
    },
    /// The provider rejected or failed a remote call.
    #[error(
        "{operation} failed{}: {source}",
        .id.map_or_else(String::new, |id| format!(" for resource {id}"))
    )]
    Remote {
        /// Remote operation name.
        operation: &'static str,
        /// Resource identifier when the call concerned one.
        id: Option<ResourceId>,
        /// Provider error.
        #[source]
        source: E,
    },
    /// A poll loop exhausted its budget before observing the goal.
    #[error("resource {id} not {goal} after {attempts} polls")]
    Timeout {
        /// Resource identifier.
        id: ResourceId,
        /// Condition the loop waited for.
        goal: WaitGoal,
        /// Number of polls performed.
        attempts: u32,
    },
}

impl<E> LifecycleError<E>
where
    E: std::error::Error + 'static,
{
    /// Wraps a provider error from a call concerning `id`.
    #[must_use]
    pub const fn remote(operation: &'static str, id: ResourceId, source: E) -> Self {
        Self::Remote {
            operation,
            id: Some(id),
            source,
        }
    }
}
