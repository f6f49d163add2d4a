//! Tests for the synchronous transitions and their preconditions.

use rstest::rstest;

use super::{orchestrator, running, session};
use crate::lifecycle::LifecycleError;
use crate::resource::{ResourceFlags, ResourceId, TransitionKind};
use crate::session::Session;
use crate::test_support::{ScriptedBackend, resource};

#[rstest]
#[tokio::test]
async fn freeze_rejects_running_resource_without_remote_call(session: Session<ScriptedBackend>) {
    session.backend().push_resource(running(12));

    let err = orchestrator(&session)
        .freeze(ResourceId(12))
        .await
        .expect_err("running resource must not freeze");

    assert!(
        matches!(
            err,
            LifecycleError::Precondition {
                operation: TransitionKind::Freeze,
                id: ResourceId(12),
                ..
            }
        ),
        "unexpected error: {err}"
    );
    assert_eq!(session.backend().calls(TransitionKind::Freeze), 0);
}

#[rstest]
#[tokio::test]
async fn freeze_stopped_resource_returns_snapshot(session: Session<ScriptedBackend>) {
    session.backend().push_status(12, "READY");

    let frozen = orchestrator(&session)
        .freeze(ResourceId(12))
        .await
        .expect("stopped resource should freeze");

    assert!(frozen.flags.frozen);
    assert_eq!(session.backend().calls(TransitionKind::Freeze), 1);
}

#[rstest]
#[tokio::test]
async fn freeze_lookup_failure_is_remote_error(session: Session<ScriptedBackend>) {
    let err = orchestrator(&session)
        .freeze(ResourceId(404))
        .await
        .expect_err("unknown resource");

    assert!(matches!(err, LifecycleError::Remote { operation: "status", .. }));
    assert_eq!(session.backend().calls(TransitionKind::Freeze), 0);
}

#[rstest]
#[tokio::test]
async fn clone_rejects_frozen_resource(session: Session<ScriptedBackend>) {
    let mut frozen = resource(21, "FROZEN");
    frozen.flags = ResourceFlags {
        frozen: true,
        ..ResourceFlags::default()
    };
    session.backend().push_resource(frozen);

    let err = orchestrator(&session)
        .clone_resource(ResourceId(21), &String::from("copy"))
        .await
        .expect_err("frozen resource must not clone");

    assert!(matches!(err, LifecycleError::Precondition { .. }));
    assert_eq!(session.backend().calls(TransitionKind::Clone), 0);
}

#[rstest]
#[tokio::test]
async fn clone_returns_new_snapshot(session: Session<ScriptedBackend>) {
    session.backend().push_resource(running(21));

    let clone = orchestrator(&session)
        .clone_resource(ResourceId(21), &String::from("copy"))
        .await
        .expect("clone should succeed");

    assert_eq!(clone.name, "copy");
    assert_eq!(session.backend().calls(TransitionKind::Clone), 1);
}

#[rstest]
#[tokio::test]
async fn shutdown_start_and_thaw_surface_provider_snapshot(session: Session<ScriptedBackend>) {
    let orchestrator = orchestrator(&session);

    let stopped = orchestrator.shutdown(ResourceId(3)).await.expect("shutdown");
    let started = orchestrator.start(ResourceId(3), 20).await.expect("start");
    let thawed = orchestrator.thaw(ResourceId(3), 20).await.expect("thaw");

    assert_eq!(stopped.status.as_str(), "off");
    assert!(started.flags.running);
    assert_eq!(thawed.status.as_str(), "active");
    // synchronous transitions never poll
    assert_eq!(session.backend().fetches(3), 0);
}

#[rstest]
#[tokio::test]
async fn shutdown_failure_is_remote_error(session: Session<ScriptedBackend>) {
    session.backend().fail_on(TransitionKind::Shutdown);

    let err = orchestrator(&session)
        .shutdown(ResourceId(3))
        .await
        .expect_err("shutdown should fail");

    assert!(matches!(
        err,
        LifecycleError::Remote {
            operation: "shutdown",
            id: Some(ResourceId(3)),
            ..
        }
    ));
}
