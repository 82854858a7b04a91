//! Pass/fail bookkeeping and console reporting
//!
//! Suites record every check through [`Reporter::log_test`]. The console
//! output is the primary interface of this tool, so it goes to stdout;
//! diagnostics go through `tracing`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::Result;

/// Width of the `=` rules around banners
pub const RULE_WIDTH: usize = 80;

/// One recorded check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRecord {
    pub test: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: DateTime<Local>,
}

/// Collects [`TestRecord`]s and prints them as they arrive
#[derive(Debug, Default)]
pub struct Reporter {
    records: Vec<TestRecord>,
    rule_width: usize,
    /// Repeat failure details in the closing summary
    summary_details: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            rule_width: RULE_WIDTH,
            summary_details: false,
        }
    }

    /// Use a narrower banner rule
    pub fn with_rule_width(mut self, width: usize) -> Self {
        self.rule_width = width;
        self
    }

    /// List failure details under the issues heading of the summary
    pub fn with_summary_details(mut self, enabled: bool) -> Self {
        self.summary_details = enabled;
        self
    }

    /// Record a check and print its verdict
    pub fn log_test(
        &mut self,
        test: impl Into<String>,
        success: bool,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> bool {
        let record = TestRecord {
            test: test.into(),
            success,
            message: message.into(),
            details,
            timestamp: Local::now(),
        };

        for line in verdict_lines(&record) {
            println!("{line}");
        }

        tracing::debug!(test = %record.test, success, "Recorded check");
        self.records.push(record);
        success
    }

    pub fn pass(&mut self, test: impl Into<String>, message: impl Into<String>) -> bool {
        self.log_test(test, true, message, None)
    }

    pub fn fail(&mut self, test: impl Into<String>, message: impl Into<String>) -> bool {
        self.log_test(test, false, message, None)
    }

    /// Failure with the offending response attached
    pub fn fail_with(
        &mut self,
        test: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> bool {
        self.log_test(test, false, message, Some(details))
    }

    /// Step header, e.g. `=== TEST 1: USER REGISTRATION ===`
    pub fn section(&self, title: &str) {
        println!("\n=== {title} ===");
    }

    /// Suite banner listing its goals
    pub fn banner(&self, title: &str, goals: &[&str]) {
        println!("{title}");
        println!("{}", self.rule());
        println!("🎯 TESTING GOALS:");
        for goal in goals {
            println!("   • {goal}");
        }
        println!("{}", self.rule());
    }

    /// Closing summary: pass rate over steps, every record, then the failures
    pub fn print_summary(&self, title: &str, passed: usize, total: usize, issues_heading: &str) {
        for line in self.summary_lines(title, passed, total, issues_heading) {
            println!("{line}");
        }
    }

    /// Lines of [`Reporter::print_summary`]
    pub fn summary_lines(
        &self,
        title: &str,
        passed: usize,
        total: usize,
        issues_heading: &str,
    ) -> Vec<String> {
        let mut lines = vec![
            format!("\n{}", self.rule()),
            format!("🏁 {title}"),
            self.rule(),
            format!(
                "Tests Passed: {passed}/{total} ({:.1}%)",
                success_rate(passed, total)
            ),
            "\nDetailed Results:".to_string(),
        ];

        for record in &self.records {
            let status = if record.success { "✅" } else { "❌" };
            lines.push(format!("{status} {}: {}", record.test, record.message));
        }

        let failures = self.failures();
        if !failures.is_empty() {
            lines.push(format!("\n⚠️  {issues_heading} ({} failures):", failures.len()));
            for failure in failures {
                lines.push(format!("   • {}: {}", failure.test, failure.message));
                if let Some(details) = failure
                    .details
                    .as_ref()
                    .filter(|d| self.summary_details && has_details(d))
                {
                    lines.push(format!("     Details: {}", render_details(details)));
                }
            }
        }
        lines
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn failures(&self) -> Vec<&TestRecord> {
        self.records.iter().filter(|r| !r.success).collect()
    }

    /// Look up the most recent record with this name
    pub fn find(&self, test: &str) -> Option<&TestRecord> {
        self.records.iter().rev().find(|r| r.test == test)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand the records over, leaving the reporter empty
    pub fn take_records(&mut self) -> Vec<TestRecord> {
        std::mem::take(&mut self.records)
    }

    fn rule(&self) -> String {
        let width = if self.rule_width == 0 {
            RULE_WIDTH
        } else {
            self.rule_width
        };
        "=".repeat(width)
    }
}

/// Percentage of `passed` over `total`; zero when nothing ran
pub fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// Write records as pretty JSON
pub fn write_json(records: &[TestRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// `✅ PASS: name - message`, plus the details of a failure when there are any
fn verdict_lines(record: &TestRecord) -> Vec<String> {
    let status = if record.success { "✅ PASS" } else { "❌ FAIL" };
    let mut lines = vec![format!("{status}: {} - {}", record.test, record.message)];
    if let Some(details) = record
        .details
        .as_ref()
        .filter(|d| !record.success && has_details(d))
    {
        lines.push(format!("   Details: {}", render_details(details)));
    }
    lines
}

/// Null, empty and zero-like details are not printed
fn has_details(details: &Value) -> bool {
    crate::quality::truthy(Some(details))
}

fn render_details(details: &Value) -> String {
    match details {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
