//! Sequential batch destroy with per-id failure isolation.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::backend::Backend;
use crate::resource::{ResourceId, ResourceStatus, WaitGoal};

use super::{LifecycleError, Orchestrator};

/// How a single id in a destroy batch ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DestroyStatus {
    /// The resource reached an archived state or disappeared.
    Archived {
        /// Time from the destroy call to the terminal observation.
        elapsed: Duration,
    },
    /// The archive-wait budget ran out.
    TimedOut {
        /// Last status observed, if any poll succeeded.
        last_status: Option<ResourceStatus>,
    },
    /// The resource could not be looked up; no destroy call was made.
    LookupFailed {
        /// Provider error message.
        message: String,
    },
}

/// Outcome for one id of a destroy batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DestroyOutcome {
    /// Resource identifier.
    pub id: ResourceId,
    /// Number of archive-wait polls performed.
    pub polls: u32,
    /// Terminal state of this id.
    pub status: DestroyStatus,
}

impl DestroyOutcome {
    /// True when the resource was confirmed archived or gone.
    #[must_use]
    pub const fn archived(&self) -> bool {
        matches!(self.status, DestroyStatus::Archived { .. })
    }
}

/// Per-id outcomes of a destroy batch, in request order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DestroyReport {
    /// One entry per requested id.
    pub outcomes: Vec<DestroyOutcome>,
}

impl DestroyReport {
    /// Ids that were not confirmed archived.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<ResourceId> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.archived())
            .map(|outcome| outcome.id)
            .collect()
    }

    /// True when every id was confirmed archived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(DestroyOutcome::archived)
    }
}

impl<B: Backend> Orchestrator<'_, B> {
    /// Destroys each id in turn, waiting for the archive state before moving
    /// on.
    ///
    /// Lookup failures and archive-wait timeouts are recorded per id and the
    /// batch continues.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Unsupported`] when the provider cannot
    /// destroy resources, and [`LifecycleError::Remote`] as soon as a destroy
    /// call fails; ids after the failing one are not processed.
    pub async fn destroy(
        &self,
        ids: &[ResourceId],
    ) -> Result<DestroyReport, LifecycleError<B::Error>> {
        self.ensure_supported(crate::resource::TransitionKind::Destroy)?;
        let backend = self.session.backend();
        let mut report = DestroyReport::default();

        for &id in ids {
            let resource = match backend.get_resource(id).await {
                Ok(resource) => resource,
                Err(err) => {
                    error!(resource_id = %id, error = %err, "unable to look up resource");
                    report.outcomes.push(DestroyOutcome {
                        id,
                        polls: 0,
                        status: DestroyStatus::LookupFailed {
                            message: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            info!(resource_id = %id, name = %resource.name, "destroying resource");
            backend
                .destroy_resource(id)
                .await
                .map_err(|err| LifecycleError::remote("destroy", id, err))?;

            let started = Instant::now();
            let wait = self.wait_until_archived(id).await;
            let status = if wait.archived {
                let elapsed = started.elapsed();
                debug!(resource_id = %id, elapsed_secs = elapsed.as_secs_f64(), "archived");
                info!(resource_id = %id, "resource destroyed");
                DestroyStatus::Archived { elapsed }
            } else {
                let timeout: LifecycleError<B::Error> = LifecycleError::Timeout {
                    id,
                    goal: WaitGoal::Archived,
                    attempts: wait.polls,
                };
                error!(resource_id = %id, error = %timeout, "error archiving resource");
                DestroyStatus::TimedOut {
                    last_status: wait.last_status,
                }
            };
            report.outcomes.push(DestroyOutcome {
                id,
                polls: wait.polls,
                status,
            });
        }

        Ok(report)
    }
}
