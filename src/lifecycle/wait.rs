//! Ready-wait and archive-wait poll loops.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::backend::{ApiError, Backend};
use crate::resource::{ResourceId, ResourceStatus, WaitGoal};

use super::{LifecycleError, Orchestrator, ReadyResource};

const READY_POLL_INTERVAL: Duration = Duration::from_secs(5);
const READY_MAX_ATTEMPTS: u32 = 60;
const ARCHIVE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const ARCHIVE_MAX_ATTEMPTS: u32 = 300;

/// Fixed poll interval and attempt cap for a wait loop.
///
/// The worst-case wait is `interval * (max_attempts - 1)` plus the time spent
/// in the status calls themselves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Sleep between two status polls.
    pub interval: Duration,
    /// Maximum number of status polls.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Policy used after create and rebuild.
    pub const READY: Self = Self {
        interval: READY_POLL_INTERVAL,
        max_attempts: READY_MAX_ATTEMPTS,
    };

    /// Policy used after destroy: 300 polls, one second apart.
    pub const ARCHIVE: Self = Self {
        interval: ARCHIVE_POLL_INTERVAL,
        max_attempts: ARCHIVE_MAX_ATTEMPTS,
    };

    /// Builds a custom policy.
    #[must_use]
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// What the archive-wait loop observed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct ArchiveWait {
    pub(super) archived: bool,
    pub(super) polls: u32,
    pub(super) last_status: Option<ResourceStatus>,
}

impl<B: Backend> Orchestrator<'_, B> {
    /// Polls until the backend reports the resource ready.
    ///
    /// Status call failures end the loop immediately; an exhausted budget
    /// yields [`LifecycleError::Timeout`].
    pub(super) async fn wait_until_ready(
        &self,
        id: ResourceId,
        started: Instant,
    ) -> Result<ReadyResource, LifecycleError<B::Error>> {
        let backend = self.session.backend();
        let policy = self.ready_policy;

        for attempt in 1..=policy.max_attempts {
            let resource = backend
                .get_resource(id)
                .await
                .map_err(|err| LifecycleError::remote("status", id, err))?;

            if backend.is_terminal(&resource.status, WaitGoal::Ready) {
                return Ok(ReadyResource {
                    resource,
                    polls: attempt,
                    elapsed: started.elapsed(),
                });
            }

            debug!(
                resource_id = %id,
                status = %resource.status,
                attempt,
                "waiting for resource to become ready"
            );
            if attempt < policy.max_attempts {
                sleep(policy.interval).await;
            }
        }

        Err(LifecycleError::Timeout {
            id,
            goal: WaitGoal::Ready,
            attempts: policy.max_attempts,
        })
    }

    /// Polls until the resource is archived or gone.
    ///
    /// A not-found answer counts as archived. Other status call failures are
    /// logged and consume an attempt.
    pub(super) async fn wait_until_archived(&self, id: ResourceId) -> ArchiveWait {
        let backend = self.session.backend();
        let policy = self.archive_policy;
        let mut last_status = None;

        for attempt in 1..=policy.max_attempts {
            match backend.get_resource(id).await {
                Ok(resource) if backend.is_terminal(&resource.status, WaitGoal::Archived) => {
                    return ArchiveWait {
                        archived: true,
                        polls: attempt,
                        last_status: Some(resource.status),
                    };
                }
                Ok(resource) => {
                    debug!(resource_id = %id, status = %resource.status, attempt, "status");
                    last_status = Some(resource.status);
                }
                Err(err) if err.is_not_found() => {
                    return ArchiveWait {
                        archived: true,
                        polls: attempt,
                        last_status,
                    };
                }
                Err(err) => {
                    warn!(resource_id = %id, attempt, error = %err, "status poll failed");
                }
            }

            if attempt < policy.max_attempts {
                sleep(policy.interval).await;
            }
        }

        ArchiveWait {
            archived: false,
            polls: policy.max_attempts,
            last_status,
        }
    }
}
