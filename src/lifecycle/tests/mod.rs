//! Unit tests for the lifecycle orchestrator.

use std::time::Duration;

use rstest::{fixture, rstest};

use super::{LifecycleError, LifecycleOutcome, LifecycleRequest, Orchestrator, PollPolicy};
use crate::resource::{ResourceFlags, ResourceId, TransitionKind};
use crate::session::Session;
use crate::test_support::{FIRST_CREATED_ID, ScriptedBackend, ScriptedError, resource};

mod transitions;

const FAST_READY: PollPolicy = PollPolicy::new(Duration::from_secs(5), 4);

#[fixture]
fn session() -> Session<ScriptedBackend> {
    Session::new(ScriptedBackend::new())
}

fn orchestrator(session: &Session<ScriptedBackend>) -> Orchestrator<'_, ScriptedBackend> {
    Orchestrator::new(session).with_ready_policy(FAST_READY)
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn execute_routes_create_to_ready_wait(session: Session<ScriptedBackend>) {
    session
        .backend()
        .push_statuses(FIRST_CREATED_ID, &["new", "active"]);

    let outcome = orchestrator(&session)
        .execute(&LifecycleRequest::Create(String::from("web-1")))
        .await
        .expect("create should succeed");

    let LifecycleOutcome::Ready(ready) = outcome else {
        panic!("expected ready outcome, got {outcome:?}");
    };
    assert_eq!(ready.resource.id, ResourceId(FIRST_CREATED_ID));
    assert_eq!(ready.polls, 2);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn execute_routes_destroy_to_batch(session: Session<ScriptedBackend>) {
    session.backend().push_statuses(7, &["active", "off"]);

    let outcome = orchestrator(&session)
        .execute(&LifecycleRequest::Destroy(vec![ResourceId(7)]))
        .await
        .expect("destroy should succeed");

    let LifecycleOutcome::Destroyed(report) = outcome else {
        panic!("expected destroy report, got {outcome:?}");
    };
    assert!(report.is_complete());
}

#[rstest]
#[case(LifecycleRequest::Rebuild { id: ResourceId(1), image_id: 9 })]
#[case(LifecycleRequest::Shutdown(ResourceId(1)))]
#[case(LifecycleRequest::Start { id: ResourceId(1), plan_id: 20 })]
#[case(LifecycleRequest::Freeze(ResourceId(1)))]
#[case(LifecycleRequest::Thaw { id: ResourceId(1), plan_id: 20 })]
#[case(LifecycleRequest::Clone { id: ResourceId(1), options: String::from("copy") })]
#[tokio::test(start_paused = true)]
async fn unsupported_transitions_make_no_remote_calls(
    session: Session<ScriptedBackend>,
    #[case] request: LifecycleRequest<String, String>,
) {
    let kind = request.kind();
    session.backend().disable(kind);
    session.backend().push_status(1, "active");

    let err = orchestrator(&session)
        .execute(&request)
        .await
        .expect_err("disabled transition should fail");

    assert!(
        matches!(err, LifecycleError::Unsupported { operation, .. } if operation == kind),
        "unexpected error: {err}"
    );
    assert_eq!(session.backend().calls(kind), 0);
    assert_eq!(session.backend().fetches(1), 0);
}

#[test]
fn remote_error_names_operation_and_id() {
    let err: LifecycleError<ScriptedError> = LifecycleError::remote(
        "destroy",
        ResourceId(42),
        ScriptedError::Remote(String::from("boom")),
    );
    assert_eq!(
        err.to_string(),
        "destroy failed for resource 42: scripted failure: boom"
    );
}

#[test]
fn request_kind_matches_variant() {
    let request: LifecycleRequest<String, String> = LifecycleRequest::Thaw {
        id: ResourceId(3),
        plan_id: 20,
    };
    assert_eq!(request.kind(), TransitionKind::Thaw);
}

fn running(id: u64) -> crate::resource::Resource {
    let mut snapshot = resource(id, "READY");
    snapshot.flags = ResourceFlags {
        running: true,
        ..ResourceFlags::default()
    };
    snapshot
}
