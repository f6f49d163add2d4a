//! Behavioural tests for `boxctl do` against a canned DigitalOcean API.
//!
//! The canned server runs on the test's tokio runtime while the binary blocks
//! the test thread, so these tests use the multi-threaded runtime.

use boxctl::test_support::{CannedHttpServer, CannedResponse};
use predicates::str::contains;
use tempfile::TempDir;

#[path = "common/isolated.rs"]
mod isolated;

const ACTIVE_DROPLET: &str =
    r#"{"status":"OK","droplet":{"id":7,"name":"web","status":"active","locked":false}}"#;
const OFF_DROPLET: &str =
    r#"{"status":"OK","droplet":{"id":7,"name":"web","status":"off","locked":false}}"#;
const EVENT: &str = r#"{"status":"OK","event_id":1234}"#;

async fn canned(responses: Vec<CannedResponse>) -> CannedHttpServer {
    CannedHttpServer::start(responses)
        .await
        .unwrap_or_else(|err| panic!("canned server: {err}"))
}

fn boxctl_against(server: &CannedHttpServer, root: &TempDir) -> assert_cmd::Command {
    let mut cmd = isolated::boxctl(root.path());
    cmd.env("DIGITAL_OCEAN_CLIENT_ID", "client")
        .env("DIGITAL_OCEAN_API_KEY", "secret")
        .env("DIGITAL_OCEAN_API_BASE", server.base_url());
    cmd
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn region_list_renders_catalogue() {
    let server = canned(vec![CannedResponse::ok(
        r#"{"status":"OK","regions":[{"id":1,"name":"New York 1","slug":"nyc1"},{"id":2,"name":"Amsterdam 1","slug":"ams1"}]}"#,
    )])
    .await;
    let root = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));

    boxctl_against(&server, &root)
        .args(["do", "region", "list"])
        .assert()
        .success()
        .stdout("Id  Name\n1   New York 1\n2   Amsterdam 1\n");

    let targets: Vec<String> = server
        .requests()
        .into_iter()
        .map(|request| request.target)
        .collect();
    assert_eq!(targets, vec![String::from("/regions/?client_id=client&api_key=secret")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn destroy_waits_until_droplet_is_off() {
    let server = canned(vec![
        CannedResponse::ok(ACTIVE_DROPLET),
        CannedResponse::ok(EVENT),
        CannedResponse::ok(OFF_DROPLET),
    ])
    .await;
    let root = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));

    boxctl_against(&server, &root)
        .args(["do", "droplet", "destroy", "7"])
        .assert()
        .success()
        .stdout(contains("7   destroyed  1"));

    let requests = server.requests();
    assert_eq!(
        requests.get(1).map(|request| request.target.as_str()),
        Some("/droplets/7/destroy?client_id=client&api_key=secret")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_droplet_fails_the_batch() {
    let server = canned(vec![CannedResponse::with_status(
        404,
        r#"{"status":"ERROR","error_message":"Droplet not found"}"#,
    )])
    .await;
    let root = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));

    boxctl_against(&server, &root)
        .args(["do", "droplet", "destroy", "9"])
        .assert()
        .code(1)
        .stdout(contains("skipped"))
        .stderr(contains("not confirmed destroyed: 9"));

    assert_eq!(server.requests().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rename_reports_api_errors() {
    let server = canned(vec![CannedResponse::ok(
        r#"{"status":"ERROR","error_message":"Name is invalid"}"#,
    )])
    .await;
    let root = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));

    boxctl_against(&server, &root)
        .args(["do", "droplet", "rename", "7", "bad name"])
        .assert()
        .code(1)
        .stderr(contains("Name is invalid"));
}
