//! Enhanced Google Maps scraper check
//!
//! Creates a small maps run, waits for it, and grades the first place on
//! detail-page navigation, critical-field validity, breadth of extracted
//! fields and `additionalInfo` sections.

use serde_json::{json, Value};

use super::{status_or_no_response, SuiteContext};
use crate::error::Result;
use crate::models::CreateRunRequest;
use crate::poll::{format_elapsed, poll_run, PollOutcome};
use crate::quality::{
    additional_info_categories, analyze_fields, count_all_fields, field_coverage,
    is_business_title, render_sample, validate_critical_fixes, validate_enhanced_data,
    CoordinateRule, FieldCheck, FieldKind, Tally,
};
use crate::report::Reporter;

/// Fields that were empty before the navigation fix
pub const CRITICAL_FIELDS: &[&str] = &["title", "address", "phone", "website", "location"];

/// Every key the enhanced scraper is expected to emit
pub const ENHANCED_FIELDS: &[&str] = &[
    "title", "address", "phone", "phoneUnformatted", "totalScore", "reviewsCount",
    "location", "website", "categoryName", "categories",
    "street", "city", "state", "postalCode", "countryCode", "neighborhood",
    "placeId", "cid", "fid", "price", "permanentlyClosed", "temporarilyClosed",
    "claimThisBusiness", "openingHours", "imagesCount", "imageUrl", "imageCategories",
    "reviewsTags", "peopleAlsoSearch", "placesTags", "additionalInfo", "socialMedia",
    "url", "searchPageUrl", "rank", "isAdvertisement", "scrapedAt", "kgmid",
];

/// Slack allowed below the target field count
const FIELD_COUNT_TOLERANCE: usize = 5;

/// Inputs and targets of one enhanced-scraper check
#[derive(Debug, Clone)]
pub struct EnhancedMapsCase {
    pub actor_id: &'static str,
    pub name: &'static str,
    pub input: Value,
    pub critical_fields: &'static [&'static str],
    pub expected_fields: &'static [&'static str],
    pub target_field_count: usize,
    /// Percent of critical fields that must be valid
    pub target_critical_validity: f64,
    pub target_additional_info_categories: usize,
}

impl EnhancedMapsCase {
    /// Three New York restaurants, graded against the post-fix targets
    pub fn critical_fixes() -> Self {
        Self {
            actor_id: "google-maps",
            name: "Google Maps Enhanced Scraper (Critical Fixes Applied)",
            input: json!({
                "query": "restaurant",
                "location": "New York",
                "maxResults": 3
            }),
            critical_fields: CRITICAL_FIELDS,
            expected_fields: ENHANCED_FIELDS,
            target_field_count: 49,
            target_critical_validity: 80.0,
            target_additional_info_categories: 4,
        }
    }

    fn test_name(&self, suffix: &str) -> String {
        format!("{} - {suffix}", self.name)
    }
}

/// Create the run, poll it, and grade the output
pub async fn run_case(ctx: &mut SuiteContext, case: &EnhancedMapsCase) -> Result<bool> {
    println!("\n--- Testing {} ({}) ---", case.name, case.actor_id);
    println!("Input: {}", case.input);
    println!("🎯 CRITICAL FIXES TESTING REQUIREMENTS:");
    println!("   • Navigation to actual business detail pages (NOT search results)");
    println!("   • Title should be business name (NOT 'Hours', 'Menu', etc.)");
    println!(
        "   • Critical fields validity: {}%+ (PREVIOUS: 25%)",
        case.target_critical_validity
    );
    println!("   • Address, phone, website, coordinates should be populated");
    println!("   • Field count: {} fields maintained", case.target_field_count);
    println!(
        "   • Additional info categories: {}+ maintained",
        case.target_additional_info_categories
    );

    let request = CreateRunRequest::new(case.actor_id, case.input.clone());
    let response = ctx.client.create_run(&request).await;

    let create_test = case.test_name("Create Run");
    let created = match &response {
        Ok(r) if r.is_status(201) => r,
        _ => {
            return Ok(ctx.reporter.fail(
                create_test,
                format!("Failed to create run: {}", status_or_no_response(&response)),
            ));
        }
    };

    let body: Value = created.json()?;
    let Some(run_id) = body.get("runId").and_then(Value::as_str).map(str::to_string) else {
        return Ok(ctx.reporter.fail(create_test, "No runId in response"));
    };
    ctx.reporter.pass(create_test, format!("Run created: {run_id}"));

    let settings = ctx.config.polling.enhanced_maps;
    let outcome = poll_run(&ctx.client, &run_id, &settings, |tick| {
        println!("   Status: {} ({} elapsed)", tick.status, format_elapsed(tick.waited));
        if tick.progress_due {
            println!(
                "   🔄 Enhanced scraping in progress... ({} elapsed)",
                format_elapsed(tick.waited)
            );
        }
    })
    .await;

    match outcome {
        PollOutcome::Succeeded(run) => {
            let Some(place) = run.output.first() else {
                return Ok(ctx
                    .reporter
                    .fail(case.test_name("Output"), "No output data returned"));
            };
            println!("✅ Scraped {} places successfully", run.output.len());
            Ok(evaluate_place(&mut ctx.reporter, case, place))
        }
        PollOutcome::Failed { error } => Ok(ctx.reporter.fail(
            case.test_name("Execution"),
            format!("Enhanced scraper failed: {error}"),
        )),
        PollOutcome::StatusUnavailable { reason } => {
            tracing::warn!(run_id = %run_id, reason = %reason, "Lost track of run");
            Ok(ctx
                .reporter
                .fail(case.test_name("Check Status"), "Failed to get run status"))
        }
        PollOutcome::TimedOut { .. } => Ok(ctx.reporter.fail(
            case.test_name("Execution"),
            format!(
                "Enhanced scraper timed out after {}",
                format_elapsed(settings.max_wait())
            ),
        )),
    }
}

fn critical_checks(fields: &'static [&'static str]) -> Vec<FieldCheck> {
    fields
        .iter()
        .map(|field| {
            if *field == "location" {
                FieldCheck::with_kind(
                    field,
                    field,
                    FieldKind::Coordinates(CoordinateRule::NonNull),
                )
            } else {
                FieldCheck::plain(field, field)
            }
        })
        .collect()
}

/// Grade one place, record the verdicts, and return the overall result
pub fn evaluate_place(reporter: &mut Reporter, case: &EnhancedMapsCase, place: &Value) -> bool {
    let total_fields = count_all_fields(place);
    println!("\n📊 TOTAL FIELDS EXTRACTED: {total_fields}");

    println!("\n🔍 CRITICAL NAVIGATION VALIDATION:");
    let title = place.get("title").and_then(Value::as_str);
    let is_business_page = is_business_title(title);
    let mark = if is_business_page { "✅" } else { "❌" };
    println!(
        "   {mark} Business Detail Page Navigation: Title='{}'",
        title.unwrap_or("")
    );

    println!(
        "\n📊 CRITICAL FIELDS VALIDATION (Target: {}%+):",
        case.target_critical_validity
    );
    let verdicts = analyze_fields(place, &critical_checks(case.critical_fields), 100);
    for verdict in &verdicts {
        println!("{}", verdict.line());
    }
    let critical_rate = Tally::of(&verdicts).rate();

    let info_categories = additional_info_categories(place);
    println!("\n📊 ADDITIONAL INFO CATEGORIES: {info_categories} (PREVIOUS: 2)");
    if let Some(info) = place.get("additionalInfo").and_then(Value::as_object) {
        if !info.is_empty() {
            let names: Vec<&String> = info.keys().take(8).collect();
            let more = if info.len() > 8 { "..." } else { "" };
            println!("   Categories found: {names:?}{more}");
        }
    }

    let coverage = field_coverage(place, case.expected_fields);
    println!(
        "\n📈 FIELD COVERAGE: {}/{} ({:.1}%)",
        coverage.present.len(),
        case.expected_fields.len(),
        coverage.percent()
    );
    if !coverage.missing.is_empty() {
        let shown: Vec<&String> = coverage.missing.iter().take(10).collect();
        let more = if coverage.missing.len() > 10 { "..." } else { "" };
        println!("Missing fields: {shown:?}{more}");
    }

    println!("\n🧪 ENHANCED DATA CHECKS:");
    for validation in validate_enhanced_data(place, total_fields, info_categories) {
        let mark = if validation.success { "✅" } else { "❌" };
        println!("   {mark} {}: {}", validation.aspect, validation.message);
    }

    let navigation_ok = is_business_page;
    let validity_ok = critical_rate >= case.target_critical_validity;
    let field_count_ok =
        total_fields >= case.target_field_count.saturating_sub(FIELD_COUNT_TOLERANCE);
    let info_ok = info_categories >= case.target_additional_info_categories;

    reporter.log_test(
        case.test_name("Navigation Fix"),
        navigation_ok,
        format!(
            "Business detail page navigation: {}",
            if navigation_ok {
                "SUCCESS"
            } else {
                "FAILED - extracting from search results"
            }
        ),
        None,
    );
    reporter.log_test(
        case.test_name("Critical Field Validity"),
        validity_ok,
        format!(
            "Critical fields validity: {critical_rate:.1}% (target: {}%+)",
            case.target_critical_validity
        ),
        None,
    );
    reporter.log_test(
        case.test_name("Field Count Maintained"),
        field_count_ok,
        format!(
            "Field count: {total_fields} (target: {}+)",
            case.target_field_count
        ),
        None,
    );
    reporter.log_test(
        case.test_name("Additional Info Maintained"),
        info_ok,
        format!(
            "Additional info categories: {info_categories} (target: {}+)",
            case.target_additional_info_categories
        ),
        None,
    );

    for validation in validate_critical_fixes(place, is_business_page) {
        reporter.log_test(
            case.test_name(validation.aspect),
            validation.success,
            validation.message,
            None,
        );
    }

    let overall = navigation_ok && validity_ok && field_count_ok && info_ok;
    if overall {
        reporter.pass(
            case.test_name("Overall Success"),
            format!(
                "✅ CRITICAL FIXES SUCCESSFUL: Navigation working, {critical_rate:.1}% critical fields valid, {total_fields} fields extracted"
            ),
        );
    } else {
        let mut issues = Vec::new();
        if !navigation_ok {
            issues.push("navigation to business pages".to_string());
        }
        if !validity_ok {
            issues.push(format!(
                "critical field validity ({critical_rate:.1}% < {}%)",
                case.target_critical_validity
            ));
        }
        if !field_count_ok {
            issues.push(format!(
                "field count ({total_fields} < {})",
                case.target_field_count
            ));
        }
        if !info_ok {
            issues.push(format!(
                "additional info categories ({info_categories} < {})",
                case.target_additional_info_categories
            ));
        }
        reporter.fail(
            case.test_name("Overall Success"),
            format!("❌ CRITICAL FIXES INCOMPLETE: Issues with {}", issues.join(", ")),
        );
    }

    println!("\n📋 COMPLETE SAMPLE DATA (Place 1):");
    for line in render_sample(place) {
        println!("{line}");
    }

    overall
}
