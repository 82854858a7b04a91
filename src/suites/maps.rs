//! Google Maps scraper suite
//!
//! Registers a user, confirms the `google-maps` actor is listed, runs a
//! three-result search, and grades the first place on critical and
//! enhanced fields. Registration and actor lookup gate the rest.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info};

use super::{register_user, status_or_no_response, Suite, SuiteContext, SuiteReport};
use crate::error::{ProbeErrorTrait, Result};
use crate::models::{Actor, CreateRunRequest, RegisterRequest};
use crate::poll::{format_elapsed, poll_run, PollOutcome};
use crate::quality::{
    analyze_fields, count_all_fields, display_value, truncate_display, CoordinateRule, FieldCheck,
    FieldKind, Tally,
};
use crate::report::Reporter;

pub const MAPS_ACTOR: &str = "google-maps";

/// Fields a real business page always has
pub const CRITICAL_FIELDS: &[FieldCheck] = &[
    FieldCheck::plain("name", "Business Name"),
    FieldCheck::plain("fullAddress", "Address"),
    FieldCheck::plain("phone", "Phone Number"),
    FieldCheck::plain("website", "Website"),
    FieldCheck::with_kind(
        "location",
        "Coordinates",
        FieldKind::Coordinates(CoordinateRule::NonZero),
    ),
];

/// Fields of the comprehensive extraction
pub const ENHANCED_FIELDS: &[FieldCheck] = &[
    FieldCheck::plain("rating", "Rating"),
    FieldCheck::plain("reviewsCount", "Review Count"),
    FieldCheck::plain("mainCategory", "Category"),
    FieldCheck::with_kind("openingHours", "Opening Hours", FieldKind::HoursMap),
    FieldCheck::with_kind("photos", "Photos", FieldKind::PhotoList),
    FieldCheck::with_kind("social", "Social Media", FieldKind::LinkMap),
    FieldCheck::plain("emails", "Email Addresses"),
];

const MIN_CRITICAL_FIELDS: usize = 3;
const MIN_TOTAL_FIELDS: usize = 20;
const MIN_CRITICAL_RATE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapsStep {
    RegisterUser,
    VerifyActor,
    CreateRun,
    MonitorRun,
}

impl MapsStep {
    const ALL: [MapsStep; 4] = [
        Self::RegisterUser,
        Self::VerifyActor,
        Self::CreateRun,
        Self::MonitorRun,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::RegisterUser => "register_user",
            Self::VerifyActor => "verify_google_maps_actor",
            Self::CreateRun => "create_google_maps_run",
            Self::MonitorRun => "monitor_run_and_verify_output",
        }
    }

    /// A failed critical step stops the sequence
    fn is_critical(&self) -> bool {
        matches!(self, Self::RegisterUser | Self::VerifyActor)
    }
}

/// End-to-end check of the Google Maps scraper
pub struct MapsSuite {
    ctx: SuiteContext,
    input: Value,
    run_id: Option<String>,
}

impl MapsSuite {
    pub fn new(ctx: SuiteContext) -> Self {
        Self {
            ctx,
            input: json!({
                "query": "restaurants",
                "location": "New York",
                "maxResults": 3
            }),
            run_id: None,
        }
    }

    async fn run_step(&mut self, step: MapsStep) -> Result<bool> {
        match step {
            MapsStep::RegisterUser => {
                self.ctx.reporter.section("TEST 1: USER REGISTRATION");
                let request = RegisterRequest::unique(
                    "mapstester",
                    "mapstester",
                    "testdomain.com",
                    "SecurePass123!",
                    "Maps Tester",
                );
                register_user(&mut self.ctx, request).await
            }
            MapsStep::VerifyActor => {
                self.ctx.reporter.section("TEST 2: VERIFY GOOGLE MAPS ACTOR");
                self.verify_actor().await
            }
            MapsStep::CreateRun => {
                self.ctx.reporter.section("TEST 3: CREATE GOOGLE MAPS RUN");
                self.create_run().await
            }
            MapsStep::MonitorRun => {
                self.ctx.reporter.section("TEST 4: MONITOR RUN AND VERIFY OUTPUT");
                self.monitor_run().await
            }
        }
    }

    async fn verify_actor(&mut self) -> Result<bool> {
        const STEP: &str = "Verify Google Maps Actor";
        if !self.ctx.has_token() {
            return Ok(self.ctx.reporter.fail(STEP, "No auth token available"));
        }

        let Ok(response) = self.ctx.client.list_actors().await else {
            return Ok(self
                .ctx
                .reporter
                .fail(STEP, "Failed to connect to actors endpoint"));
        };

        if !response.is_status(200) {
            return Ok(self.ctx.reporter.fail_with(
                STEP,
                format!("Failed to get actors: {}", response.status),
                Value::String(response.body.clone()),
            ));
        }

        let actors: Vec<Actor> = response.json()?;
        match actors.iter().find(|a| a.actor_id == MAPS_ACTOR) {
            Some(actor) => {
                self.ctx.reporter.pass(
                    "Google Maps Actor Found",
                    format!(
                        "Google Maps actor found: {}",
                        actor.name.as_deref().unwrap_or("Unknown")
                    ),
                );
                println!("   Actor Details:");
                println!("   - ID: {}", actor.actor_id);
                println!("   - Name: {}", actor.name.as_deref().unwrap_or("None"));
                println!("   - Title: {}", actor.title.as_deref().unwrap_or("None"));
                let description: String = actor
                    .description
                    .as_deref()
                    .unwrap_or("")
                    .chars()
                    .take(100)
                    .collect();
                println!("   - Description: {description}...");
                Ok(true)
            }
            None => {
                let available: Vec<&str> = actors.iter().map(|a| a.actor_id.as_str()).collect();
                Ok(self.ctx.reporter.fail(
                    "Google Maps Actor Found",
                    format!("Google Maps actor not found. Available actors: {available:?}"),
                ))
            }
        }
    }

    async fn create_run(&mut self) -> Result<bool> {
        const STEP: &str = "Create Google Maps Run";
        if !self.ctx.has_token() {
            return Ok(self.ctx.reporter.fail(STEP, "No auth token available"));
        }

        println!("Creating run with input: {}", self.input);
        let request = CreateRunRequest::new(MAPS_ACTOR, self.input.clone());
        let response = self.ctx.client.create_run(&request).await;

        let created = match &response {
            Ok(r) if r.is_status(201) => r,
            _ => {
                return Ok(self.ctx.reporter.fail(
                    STEP,
                    format!("Failed to create run: {}", status_or_no_response(&response)),
                ));
            }
        };

        let body: Value = created.json()?;
        match body.get("runId").and_then(Value::as_str) {
            Some(run_id) => {
                self.run_id = Some(run_id.to_string());
                Ok(self
                    .ctx
                    .reporter
                    .pass(STEP, format!("Run created successfully: {run_id}")))
            }
            None => Ok(self.ctx.reporter.fail(STEP, "No runId in response")),
        }
    }

    async fn monitor_run(&mut self) -> Result<bool> {
        let Some(run_id) = self.run_id.clone().filter(|_| self.ctx.has_token()) else {
            return Ok(self
                .ctx
                .reporter
                .fail("Monitor Run", "No auth token or run ID available"));
        };

        let settings = self.ctx.config.polling.maps;
        println!(
            "Monitoring run {run_id} (max wait: {})",
            format_elapsed(settings.max_wait())
        );

        let outcome = poll_run(&self.ctx.client, &run_id, &settings, |tick| {
            println!("   Status: {} ({} elapsed)", tick.status, format_elapsed(tick.waited));
            if tick.progress_due {
                println!(
                    "   🔄 Scraping in progress... ({} elapsed)",
                    format_elapsed(tick.waited)
                );
            }
        })
        .await;

        let reporter = &mut self.ctx.reporter;
        match outcome {
            PollOutcome::Succeeded(run) => Ok(verify_output(reporter, &run.output)),
            PollOutcome::Failed { error } => {
                Ok(reporter.fail("Run Execution", format!("Scraper failed: {error}")))
            }
            PollOutcome::StatusUnavailable { reason } => {
                tracing::warn!(run_id = %run_id, reason = %reason, "Lost track of run");
                Ok(reporter.fail("Monitor Run", "Failed to get run status"))
            }
            PollOutcome::TimedOut { .. } => Ok(reporter.fail(
                "Run Execution",
                format!(
                    "Scraper timed out after {}",
                    format_elapsed(settings.max_wait())
                ),
            )),
        }
    }
}

/// Check the `[{results: [...]}]` envelope and analyze the first place
pub fn verify_output(reporter: &mut Reporter, output: &[Value]) -> bool {
    println!("\n--- VERIFYING SCRAPER OUTPUT ---");

    let Some(first) = output.first() else {
        return reporter.fail("Scraper Output", "No output data returned");
    };
    println!("✅ Scraped data returned: {} result(s)", output.len());

    let Some(results) = first.get("results") else {
        return reporter.fail("Output Structure", "Unexpected output structure");
    };
    let results = results.as_array().map(Vec::as_slice).unwrap_or_default();
    println!("✅ Found {} places in results", results.len());

    match results.first() {
        Some(place) => analyze_place(reporter, place, results.len()),
        None => reporter.fail("Places Found", "No places found in results"),
    }
}

/// Grade one place on critical and enhanced fields
pub fn analyze_place(reporter: &mut Reporter, place: &Value, total_places: usize) -> bool {
    println!("\n--- ANALYZING PLACE DATA (Sample from {total_places} places) ---");

    println!("\n📊 CRITICAL FIELDS ANALYSIS:");
    let critical = analyze_fields(place, CRITICAL_FIELDS, 100);
    for verdict in &critical {
        println!("{}", verdict.line());
    }
    let critical_tally = Tally::of(&critical);

    println!("\n📈 ENHANCED FIELDS ANALYSIS:");
    let enhanced = analyze_fields(place, ENHANCED_FIELDS, 50);
    for verdict in &enhanced {
        println!("{}", verdict.line());
    }
    let enhanced_tally = Tally::of(&enhanced);

    let total_fields = count_all_fields(place);

    println!("\n📊 DATA QUALITY SUMMARY:");
    println!(
        "   • Critical Fields: {}/{} ({:.1}%)",
        critical_tally.valid,
        critical_tally.total,
        critical_tally.rate()
    );
    println!(
        "   • Enhanced Fields: {}/{} ({:.1}%)",
        enhanced_tally.valid,
        enhanced_tally.total,
        enhanced_tally.rate()
    );
    println!("   • Total Fields Extracted: {total_fields}");
    println!("   • Places Scraped: {total_places}");

    let shown = |field: &str| {
        place
            .get(field)
            .map_or_else(|| "N/A".to_string(), |v| truncate_display(&display_value(v), 100))
    };
    println!("\n📋 SAMPLE PLACE DATA:");
    println!("   Name: {}", shown("name"));
    println!("   Address: {}", shown("fullAddress"));
    println!("   Phone: {}", shown("phone"));
    println!("   Website: {}", shown("website"));
    println!("   Rating: {} ({} reviews)", shown("rating"), shown("reviewsCount"));

    let real_data = critical_tally.valid >= MIN_CRITICAL_FIELDS;
    let comprehensive = total_fields >= MIN_TOTAL_FIELDS;
    let critical_rate = critical_tally.rate();
    let critical_ok = critical_rate >= MIN_CRITICAL_RATE;

    // reaching this point means the browser launched and returned data
    reporter.pass(
        "Puppeteer/Chromium Working",
        "Puppeteer successfully launched and scraped data",
    );
    reporter.log_test(
        "Real Data Extraction",
        real_data,
        format!(
            "Real business data extracted: {}/{} critical fields",
            critical_tally.valid, critical_tally.total
        ),
        None,
    );
    reporter.log_test(
        "Comprehensive Data",
        comprehensive,
        format!("Comprehensive data extraction: {total_fields} fields extracted"),
        None,
    );
    reporter.log_test(
        "Critical Fields Populated",
        critical_ok,
        format!("Critical fields populated: {critical_rate:.1}% (target: 60%+)"),
        None,
    );

    let overall = real_data && critical_ok;
    reporter.log_test(
        "Google Maps Scraper Overall",
        overall,
        format!(
            "Overall scraper quality: {}",
            if overall { "GOOD" } else { "NEEDS IMPROVEMENT" }
        ),
        None,
    );
    overall
}

#[async_trait]
impl Suite for MapsSuite {
    fn name(&self) -> &'static str {
        "maps"
    }

    async fn run(&mut self) -> SuiteReport {
        self.ctx.reporter = std::mem::take(&mut self.ctx.reporter).with_rule_width(60);
        self.ctx.reporter.banner(
            "🗺️ GOOGLE MAPS SCRAPER TESTING SUITE",
            &[
                "Register test user and get JWT token",
                "Verify Google Maps actor exists",
                "Create run with query='restaurants', location='New York', maxResults=3",
                "Monitor run completion and verify data quality",
                "Check critical fields: title, address, phone, website, coordinates",
                "Verify Puppeteer/Chromium is working correctly",
            ],
        );

        let mut passed = 0;
        for step in MapsStep::ALL {
            info!(step = step.as_str(), "Running maps step");
            match self.run_step(step).await {
                Ok(true) => passed += 1,
                Ok(false) if step.is_critical() => {
                    println!("\n❌ Critical test failed: {}", step.as_str());
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(
                        step = step.as_str(),
                        category = %e.category(),
                        recoverable = e.is_recoverable(),
                        error = %e,
                        "Maps step raised"
                    );
                    println!("❌ EXCEPTION in {}: {e}", step.as_str());
                }
            }
        }

        let total = MapsStep::ALL.len();
        self.ctx.reporter.print_summary(
            "GOOGLE MAPS SCRAPER TEST SUMMARY",
            passed,
            total,
            "ISSUES FOUND",
        );

        SuiteReport {
            name: self.name(),
            passed,
            total,
            pass_threshold: 75.0,
            records: self.ctx.reporter.take_records(),
            success_line: "🎉 GOOGLE MAPS SCRAPER TESTS PASSED!",
            failure_line: "💥 GOOGLE MAPS SCRAPER TESTS FAILED - Issues need to be addressed",
        }
    }
}
