//! Quick look at the output of one Google Maps run
//!
//! Registers a user, starts a run, and dumps every field of the first place
//! together with the 50-field requirement. Passes whenever the run returned
//! output.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{register_user, status_or_no_response, Suite, SuiteContext, SuiteReport};
use crate::error::{ProbeErrorTrait, Result};
use crate::models::{CreateRunRequest, RegisterRequest};
use crate::poll::{format_elapsed, poll_run, PollOutcome};
use crate::quality::{display_value, field_listing};

/// Top-level keys a complete place carries
pub const REQUIRED_FIELD_COUNT: usize = 50;

/// Single-run output inspection
pub struct RunOutputCheck {
    ctx: SuiteContext,
    input: Value,
}

impl RunOutputCheck {
    pub fn new(ctx: SuiteContext) -> Self {
        Self {
            ctx,
            input: json!({
                "query": "restaurant",
                "location": "New York",
                "maxResults": 3
            }),
        }
    }

    async fn check(&mut self) -> Result<bool> {
        let request = RegisterRequest::unique(
            "testuser",
            "test",
            "example.com",
            "testpassword123",
            "Test User",
        );
        if !register_user(&mut self.ctx, request).await? {
            return Ok(false);
        }

        let request = CreateRunRequest::new("google-maps", self.input.clone());
        let response = self.ctx.client.create_run(&request).await;
        let created = match &response {
            Ok(r) if r.is_status(201) => r,
            _ => {
                return Ok(self.ctx.reporter.fail(
                    "Create Run",
                    format!("Run creation failed: {}", status_or_no_response(&response)),
                ));
            }
        };

        let body: Value = created.json()?;
        let Some(run_id) = body.get("runId").and_then(Value::as_str).map(str::to_string) else {
            return Ok(self.ctx.reporter.fail("Create Run", "No runId in response"));
        };
        self.ctx
            .reporter
            .pass("Create Run", format!("Created run: {run_id}"));

        let settings = self.ctx.config.polling.run_check;
        let outcome = poll_run(&self.ctx.client, &run_id, &settings, |tick| {
            if tick.progress_due {
                println!(
                    "Waiting... ({}, status: {})",
                    format_elapsed(tick.waited),
                    tick.status
                );
            }
        })
        .await;

        let reporter = &mut self.ctx.reporter;
        match outcome {
            PollOutcome::Succeeded(run) => match run.output.first() {
                Some(place) => {
                    print_place(place, run.output.len());
                    Ok(reporter.pass(
                        "Run Output",
                        format!("{} places returned", run.output.len()),
                    ))
                }
                None => Ok(reporter.fail("Run Output", "No output data")),
            },
            PollOutcome::Failed { error } => {
                Ok(reporter.fail("Run Output", format!("Run failed: {error}")))
            }
            PollOutcome::StatusUnavailable { reason } => Ok(reporter.fail(
                "Run Output",
                format!("Failed to get run status: {reason}"),
            )),
            PollOutcome::TimedOut { .. } => Ok(reporter.fail(
                "Run Output",
                "Timeout waiting for run completion",
            )),
        }
    }
}

/// Top-level key count of a place; non-objects have none
pub fn top_level_fields(place: &Value) -> usize {
    place.as_object().map_or(0, |m| m.len())
}

/// Requirement line printed after the listing
pub fn requirement_line(fields: usize) -> String {
    if fields >= REQUIRED_FIELD_COUNT {
        format!("✅ REQUIREMENT MET: {fields} fields extracted ({REQUIRED_FIELD_COUNT}+ required)")
    } else {
        format!(
            "⚠️  REQUIREMENT NOT MET: {fields} fields extracted ({REQUIRED_FIELD_COUNT}+ required)"
        )
    }
}

fn print_place(place: &Value, places: usize) {
    let field = |key: &str, fallback: &str| {
        place
            .get(key)
            .map_or_else(|| fallback.to_string(), display_value)
    };

    println!("\n=== COMPREHENSIVE DATA EXTRACTED ({places} places) ===");
    println!("\n📍 PLACE 1: {}", field("title", "Unknown"));
    println!("Category: {}", field("categoryName", "N/A"));
    println!("Address: {}", field("address", "N/A"));
    println!("Phone: {}", field("phone", "N/A"));
    println!("Website: {}", field("website", "N/A"));
    println!(
        "Rating: {} ({} reviews)",
        field("totalScore", "N/A"),
        field("reviewsCount", "0")
    );

    let fields = top_level_fields(place);
    println!("\n=== ALL EXTRACTED FIELDS ({fields} total) ===");
    for line in field_listing(place) {
        println!("{line}");
    }

    println!("\n{}", requirement_line(fields));
}

#[async_trait]
impl Suite for RunOutputCheck {
    fn name(&self) -> &'static str {
        "check-run"
    }

    async fn run(&mut self) -> SuiteReport {
        let passed = match self.check().await {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(e) => {
                tracing::error!(
                    category = %e.category(),
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Run output check raised"
                );
                println!("❌ EXCEPTION in register_and_test: {e}");
                0
            }
        };

        SuiteReport {
            name: self.name(),
            passed,
            total: 1,
            pass_threshold: 100.0,
            records: self.ctx.reporter.take_records(),
            success_line: "✅ Run output check completed",
            failure_line: "❌ Run output check failed",
        }
    }
}
