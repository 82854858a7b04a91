//! Google Maps suite integration tests

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scrapi_probe::suites::{MapsSuite, Suite};

use crate::common::{context_for, maps_place, registry_actor, FakeBackend, RunScript};

#[tokio::test]
async fn test_maps_suite_passes() {
    let backend = FakeBackend::new(RunScript::Succeed {
        polls: 1,
        output: vec![json!({"results": [maps_place(), maps_place()]})],
    });
    let server = backend.clone().start().await;

    let report = MapsSuite::new(context_for(&server)).run().await;

    assert_eq!(report.passed, 4);
    assert_eq!(report.total, 4);
    assert!(report.is_success());
    assert_eq!(report.closing_line(), "🎉 GOOGLE MAPS SCRAPER TESTS PASSED!");
    assert_eq!(backend.runs_created(), 1);

    let find = |name: &str| report.records.iter().find(|r| r.test == name).unwrap();
    assert_eq!(
        find("Google Maps Actor Found").message,
        "Google Maps actor found: google-maps Scraper"
    );
    assert_eq!(find("Create Google Maps Run").message, "Run created successfully: run-1");
    assert_eq!(
        find("Google Maps Scraper Overall").message,
        "Overall scraper quality: GOOD"
    );
}

#[tokio::test]
async fn test_missing_actor_aborts_sequence() {
    let backend = FakeBackend::new(RunScript::Hang)
        .with_registry(vec![registry_actor("amazon"), registry_actor("website")]);
    let server = backend.clone().start().await;

    let report = MapsSuite::new(context_for(&server)).run().await;

    assert_eq!(report.passed, 1);
    assert_eq!(report.total, 4);
    assert!(!report.is_success());
    assert_eq!(backend.runs_created(), 0);

    let last = report.records.last().unwrap();
    assert_eq!(last.test, "Google Maps Actor Found");
    assert_eq!(
        last.message,
        r#"Google Maps actor not found. Available actors: ["amazon", "website"]"#
    );
}

#[tokio::test]
async fn test_unexpected_output_structure() {
    let server = FakeBackend::new(RunScript::Succeed {
        polls: 0,
        output: vec![json!({"places": [maps_place()]})],
    })
    .start()
    .await;

    let report = MapsSuite::new(context_for(&server)).run().await;

    // 3 of 4 steps still meets the 75% bar
    assert_eq!(report.passed, 3);
    assert!(report.is_success());
    let structure = report
        .records
        .iter()
        .find(|r| r.test == "Output Structure")
        .unwrap();
    assert_eq!(structure.message, "Unexpected output structure");
}

#[tokio::test]
async fn test_scraper_failure_and_poor_data() {
    let server = FakeBackend::new(RunScript::Fail {
        polls: 0,
        error: None,
    })
    .start()
    .await;

    let report = MapsSuite::new(context_for(&server)).run().await;
    let execution = report
        .records
        .iter()
        .find(|r| r.test == "Run Execution")
        .unwrap();
    assert_eq!(execution.message, "Scraper failed: Unknown error");

    let server = FakeBackend::new(RunScript::Succeed {
        polls: 0,
        output: vec![json!({"results": [{"name": "Joe's Pizza", "location": {"lat": 0, "lng": 0}}]})],
    })
    .start()
    .await;

    let report = MapsSuite::new(context_for(&server)).run().await;
    let find = |name: &str| report.records.iter().find(|r| r.test == name).unwrap();
    assert!(find("Puppeteer/Chromium Working").success);
    assert_eq!(
        find("Real Data Extraction").message,
        "Real business data extracted: 1/5 critical fields"
    );
    assert!(!find("Comprehensive Data").success);
    assert_eq!(
        find("Google Maps Scraper Overall").message,
        "Overall scraper quality: NEEDS IMPROVEMENT"
    );
}

#[tokio::test]
async fn test_registration_failure_stops_everything() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/actors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let report = MapsSuite::new(context_for(&server)).run().await;

    assert_eq!(report.passed, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(
        report.closing_line(),
        "💥 GOOGLE MAPS SCRAPER TESTS FAILED - Issues need to be addressed"
    );
}
