//! Backend suite integration tests

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scrapi_probe::suites::{BackendStep, BackendSuite, Suite};

use crate::common::{context_for, enhanced_place, registry_actor, FakeBackend, RunScript};

const ENHANCED: &str = "Google Maps Enhanced Scraper (Critical Fixes Applied)";

fn succeeding() -> RunScript {
    RunScript::Succeed {
        polls: 2,
        output: vec![enhanced_place()],
    }
}

#[tokio::test]
async fn test_all_steps_pass_against_healthy_backend() {
    let server = FakeBackend::new(succeeding()).start().await;

    let mut suite = BackendSuite::new(context_for(&server), BackendStep::ALL.to_vec());
    let report = suite.run().await;

    let failures: Vec<_> = report.records.iter().filter(|r| !r.success).collect();
    assert!(failures.is_empty(), "unexpected failures: {failures:#?}");
    assert_eq!(report.passed, 8);
    assert_eq!(report.total, 8);
    assert!(report.is_success());
    assert_eq!(
        report.closing_line(),
        "🎉 ALL TESTS PASSED - Backend is working correctly!"
    );
    assert_eq!(suite.run_id(), Some("run-1"));

    let names: Vec<&str> = report.records.iter().map(|r| r.test.as_str()).collect();
    for expected in [
        "User Registration",
        "Actor Count",
        "Public Actor Properties",
        "Expected Actors Present",
        "Empty User Actors",
        "Create Private Actor",
        "User Private Actors List",
        "Empty User Runs",
        "Create User Run",
        "User Runs List",
        "Access Own Run",
        "Access Non-existent Run",
        "Access Non-existent Actor",
        "Actors Without Auth",
        "Runs Without Auth",
        "User Login",
        "Current User",
    ] {
        assert!(names.contains(&expected), "missing record {expected}");
    }
    assert!(names.contains(&format!("{ENHANCED} - Overall Success").as_str()));
}

#[tokio::test]
async fn test_default_selection_runs_registration_and_enhanced_scraper() {
    let backend = FakeBackend::new(succeeding());
    let server = backend.clone().start().await;

    let mut suite = BackendSuite::new(context_for(&server), BackendStep::DEFAULT.to_vec());
    let report = suite.run().await;

    assert_eq!(report.total, 2);
    assert_eq!(report.passed, 2);
    assert_eq!(backend.runs_created(), 1);
    assert!(report.records.iter().all(|r| r.test != "Actor Count"));
}

#[tokio::test]
async fn test_short_registry_fails_step_two() {
    let registry = ["google-maps", "amazon", "instagram", "website", "tiktok", "twitter", "facebook"]
        .into_iter()
        .map(registry_actor)
        .collect();
    let server = FakeBackend::new(succeeding())
        .with_registry(registry)
        .start()
        .await;

    let steps = BackendStep::parse_list("1,2").unwrap();
    let report = BackendSuite::new(context_for(&server), steps).run().await;

    assert_eq!(report.passed, 1);
    assert!(!report.is_success());
    let find = |name: &str| report.records.iter().find(|r| r.test == name).unwrap();
    assert_eq!(find("Actor Count").message, "Expected 8 actors, found 7");
    assert!(find("Public Actor Properties").success);
    assert_eq!(
        find("Expected Actors Present").message,
        r#"Missing actors: ["linkedin"]"#
    );
}

#[tokio::test]
async fn test_private_actor_in_registry_listing() {
    let mut registry: Vec<_> = crate::common::REGISTRY
        .iter()
        .map(|id| registry_actor(id))
        .collect();
    registry[3]["userId"] = json!("someone-else");
    let server = FakeBackend::new(succeeding())
        .with_registry(registry)
        .start()
        .await;

    let steps = BackendStep::parse_list("1,2").unwrap();
    let report = BackendSuite::new(context_for(&server), steps).run().await;

    let props = report
        .records
        .iter()
        .find(|r| r.test == "Public Actor Properties")
        .unwrap();
    assert!(!props.success);
    assert_eq!(props.message, "Only 7 out of 8 are properly configured as public");
}

#[tokio::test]
async fn test_failed_scraper_run() {
    let server = FakeBackend::new(RunScript::Fail {
        polls: 1,
        error: Some("Navigation timeout of 30000 ms exceeded".into()),
    })
    .start()
    .await;

    let report = BackendSuite::new(context_for(&server), BackendStep::DEFAULT.to_vec())
        .run()
        .await;

    assert_eq!(report.passed, 1);
    let execution = report
        .records
        .iter()
        .find(|r| r.test == format!("{ENHANCED} - Execution"))
        .unwrap();
    assert_eq!(
        execution.message,
        "Enhanced scraper failed: Navigation timeout of 30000 ms exceeded"
    );
    assert_eq!(
        report.closing_line(),
        "💥 SOME TESTS FAILED - Issues need to be addressed"
    );
}

#[tokio::test]
async fn test_hanging_run_times_out() {
    let server = FakeBackend::new(RunScript::Hang).start().await;

    let report = BackendSuite::new(context_for(&server), BackendStep::DEFAULT.to_vec())
        .run()
        .await;

    let execution = report
        .records
        .iter()
        .find(|r| r.test == format!("{ENHANCED} - Execution"))
        .unwrap();
    assert_eq!(execution.message, "Enhanced scraper timed out after 0.1s");
}

#[tokio::test]
async fn test_search_page_output_fails_navigation() {
    let server = FakeBackend::new(RunScript::Succeed {
        polls: 0,
        output: vec![json!({"title": "Hours", "address": "", "location": null})],
    })
    .start()
    .await;

    let report = BackendSuite::new(context_for(&server), BackendStep::DEFAULT.to_vec())
        .run()
        .await;

    assert_eq!(report.passed, 1);
    let find = |suffix: &str| {
        report
            .records
            .iter()
            .find(|r| r.test == format!("{ENHANCED} - {suffix}"))
            .unwrap()
    };
    assert!(!find("Navigation Fix").success);
    assert!(!find("Navigation to Business Pages").success);
    assert!(!find("Business Name Extraction").success);
    assert!(find("Overall Success")
        .message
        .starts_with("❌ CRITICAL FIXES INCOMPLETE: Issues with navigation to business pages"));
}

#[tokio::test]
async fn test_steps_without_token_fail_fast() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "User already exists"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/actors"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/runs"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let report = BackendSuite::new(context_for(&server), BackendStep::ALL.to_vec())
        .run()
        .await;

    // only the unauthenticated checks can succeed
    assert_eq!(report.passed, 1);
    let messages: Vec<(&str, &str)> = report
        .records
        .iter()
        .map(|r| (r.test.as_str(), r.message.as_str()))
        .collect();
    assert!(messages.contains(&("User Registration", "Registration failed with status 400")));
    assert!(messages.contains(&("Actor Registry Auto-Sync", "No auth token available")));
    assert!(messages.contains(&("Access Control", "No auth token available")));
    assert!(messages.contains(&("Runs Without Auth", "Correctly returns 401 for runs endpoint without auth")));
    assert!(messages.contains(&("User Login", "No registered credentials available")));

    let registration = report
        .records
        .iter()
        .find(|r| r.test == "User Registration")
        .unwrap();
    assert_eq!(
        registration.details,
        Some(json!(r#"{"error":"User already exists"}"#))
    );
}
