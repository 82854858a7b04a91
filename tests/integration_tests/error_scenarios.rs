//! Error scenario integration tests
//!
//! Tests failure modes of the backend under test:
//! 1. Connection failures
//! 2. Undecodable bodies
//! 3. Runs that disappear while being polled
//! 4. Registration responses missing the token

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scrapi_probe::client::ApiClient;
use scrapi_probe::suites::{BackendStep, BackendSuite, MapsSuite, RunOutputCheck, Suite, SuiteContext};

use crate::common::{context_for, test_config, REGISTER_TOKEN};

// ============================================================================
// Network Error Tests
// ============================================================================

#[tokio::test]
async fn test_connection_refused() {
    let config = test_config("http://localhost:1");
    let client = ApiClient::with_base_url(config.base_url(), Duration::from_secs(1)).unwrap();

    let report = BackendSuite::new(SuiteContext::new(config, client), BackendStep::DEFAULT.to_vec())
        .run()
        .await;

    assert_eq!(report.passed, 0);
    assert_eq!(report.records[0].test, "User Registration");
    assert_eq!(
        report.records[0].message,
        "Failed to connect to registration endpoint"
    );
}

// ============================================================================
// Protocol Error Tests
// ============================================================================

async fn mount_registration(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": REGISTER_TOKEN,
            "user": {"id": "u1", "username": "testuser_1"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_malformed_registration_body_is_an_exception() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let report = RunOutputCheck::new(context_for(&server)).run().await;

    // nothing was recorded; the step raised instead
    assert_eq!(report.passed, 0);
    assert!(report.records.is_empty());
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_missing_token_in_registration() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "ok"})))
        .mount(&server)
        .await;

    let report = MapsSuite::new(context_for(&server)).run().await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].message, "Missing token or user data in response");
    assert_eq!(report.records[0].details, Some(json!({"message": "ok"})));
}

#[tokio::test]
async fn test_actor_list_not_json_counts_as_failed_step() {
    let server = MockServer::start().await;
    mount_registration(&server).await;

    Mock::given(method("GET"))
        .and(path("/actors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let steps = BackendStep::parse_list("1,2").unwrap();
    let report = BackendSuite::new(context_for(&server), steps).run().await;

    assert_eq!(report.passed, 1);
    assert_eq!(report.total, 2);
    assert!(report.records.iter().all(|r| r.test != "Actor Count"));
}

// ============================================================================
// Polling Error Tests
// ============================================================================

#[tokio::test]
async fn test_run_vanishes_while_polling() {
    let server = MockServer::start().await;
    mount_registration(&server).await;

    Mock::given(method("POST"))
        .and(path("/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "runId": "r-gone", "status": "running"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/runs/r-gone$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "runId": "r-gone", "status": "running"
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/runs/r-gone$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Run not found"})))
        .mount(&server)
        .await;

    let report = BackendSuite::new(context_for(&server), BackendStep::DEFAULT.to_vec())
        .run()
        .await;

    assert_eq!(report.passed, 1);
    let status = report.records.last().unwrap();
    assert_eq!(
        status.test,
        "Google Maps Enhanced Scraper (Critical Fixes Applied) - Check Status"
    );
    assert_eq!(status.message, "Failed to get run status");
}

#[tokio::test]
async fn test_run_creation_rejected() {
    let server = MockServer::start().await;
    mount_registration(&server).await;

    Mock::given(method("POST"))
        .and(path("/runs"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Actor not found"})))
        .mount(&server)
        .await;

    let report = RunOutputCheck::new(context_for(&server)).run().await;

    assert!(!report.is_success());
    assert_eq!(
        report.records.last().unwrap().message,
        "Run creation failed: 400"
    );
}
