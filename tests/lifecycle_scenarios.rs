//! End-to-end lifecycle scenarios driven through the public API with a
//! scripted backend and a paused clock.

use std::time::Duration;

use boxctl::lifecycle::DestroyStatus;
use boxctl::test_support::{FIRST_CREATED_ID, ScriptedBackend};
use boxctl::{
    LifecycleError, LifecycleOutcome, LifecycleRequest, Orchestrator, ResourceId, Session,
    TransitionKind,
};
use rstest::{fixture, rstest};

#[fixture]
fn session() -> Session<ScriptedBackend> {
    Session::new(ScriptedBackend::new())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn created_resource_is_returned_once_active(session: Session<ScriptedBackend>) {
    session
        .backend()
        .push_statuses(FIRST_CREATED_ID, &["new", "new", "active"]);

    let outcome = Orchestrator::new(&session)
        .execute(&LifecycleRequest::Create(String::from("web")))
        .await
        .unwrap_or_else(|err| panic!("create: {err}"));

    let LifecycleOutcome::Ready(ready) = outcome else {
        panic!("expected a ready resource, got {outcome:?}");
    };
    assert_eq!(ready.resource.id, ResourceId(FIRST_CREATED_ID));
    assert_eq!(ready.polls, 3);
    assert_eq!(ready.elapsed, Duration::from_secs(10));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn batch_destroy_reports_every_id(session: Session<ScriptedBackend>) {
    session.backend().push_statuses(1, &["active", "active", "archive"]);
    session.backend().push_statuses(3, &["active", "off"]);

    let report = Orchestrator::new(&session)
        .destroy(&[ResourceId(1), ResourceId(2), ResourceId(3)])
        .await
        .unwrap_or_else(|err| panic!("destroy: {err}"));

    assert!(!report.is_complete());
    assert_eq!(report.failed_ids(), vec![ResourceId(2)]);
    assert!(matches!(
        report.outcomes.get(1).map(|outcome| &outcome.status),
        Some(DestroyStatus::LookupFailed { .. })
    ));
    assert_eq!(session.backend().calls(TransitionKind::Destroy), 2);
}

#[rstest]
#[tokio::test]
async fn disabled_transition_never_reaches_the_provider(session: Session<ScriptedBackend>) {
    session.backend().disable(TransitionKind::Thaw);

    let err = Orchestrator::new(&session)
        .thaw(ResourceId(7), 20)
        .await
        .expect_err("thaw is disabled");

    assert!(matches!(err, LifecycleError::Unsupported { .. }), "{err}");
    assert_eq!(session.backend().calls(TransitionKind::Thaw), 0);
}
