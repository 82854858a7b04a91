//! Data-quality analysis of scraped place records
//!
//! Scraper output is untyped JSON whose shape depends on the scraper
//! version, so everything here works on [`serde_json::Value`] and treats
//! missing and malformed fields as "not populated" rather than as errors.

pub mod validation;

pub use validation::{validate_critical_fixes, validate_enhanced_data, Validation};

use serde_json::Value;

/// Titles that mean the scraper read a tab label instead of the business name
pub const GENERIC_TITLES: &[&str] = &["hours", "menu", "about", "reviews", "photos", "overview"];

/// Only the first few array items are walked when counting fields
const ARRAY_SAMPLE: usize = 3;

// ============================================================================
// Primitive checks
// ============================================================================

/// Count keys recursively
///
/// Every object key counts once; non-empty object/array values are walked.
/// Arrays contribute their first three items: containers recursively,
/// scalars as one field each.
pub fn count_all_fields(value: &Value) -> usize {
    match value {
        Value::Object(map) => map
            .values()
            .map(|v| {
                1 + if is_non_empty_container(v) {
                    count_all_fields(v)
                } else {
                    0
                }
            })
            .sum(),
        Value::Array(items) => items
            .iter()
            .take(ARRAY_SAMPLE)
            .map(|item| match item {
                Value::Object(_) | Value::Array(_) => count_all_fields(item),
                _ => 1,
            })
            .sum(),
        _ => 0,
    }
}

fn is_non_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Present, not null, not an empty string, not an empty array
pub fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Loose truthiness: null, false, zero and empty strings/containers are false
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Numbers, or strings holding a number
pub fn as_f64_lenient(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// How strictly `location.lat`/`location.lng` are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateRule {
    /// Both keys exist, whatever their value
    KeysPresent,
    /// Both keys exist and are not null
    NonNull,
    /// Both are numeric (or numeric strings) and non-zero
    NonZero,
}

/// Check the `location` object of a place
pub fn has_coordinates(place: &Value, rule: CoordinateRule) -> bool {
    let Some(location) = place.get("location").filter(|l| l.is_object()) else {
        return false;
    };
    let (lat, lng) = (location.get("lat"), location.get("lng"));

    match rule {
        CoordinateRule::KeysPresent => lat.is_some() && lng.is_some(),
        CoordinateRule::NonNull => {
            lat.is_some_and(|v| !v.is_null()) && lng.is_some_and(|v| !v.is_null())
        }
        CoordinateRule::NonZero => {
            let non_zero = |v: Option<&Value>| {
                v.and_then(as_f64_lenient)
                    .is_some_and(|f| f.abs() > 0.0)
            };
            non_zero(lat) && non_zero(lng)
        }
    }
}

/// `lat, lng` as displayed in reports
pub fn coordinates_display(place: &Value) -> String {
    let location = place.get("location").unwrap_or(&Value::Null);
    format!(
        "lat: {}, lng: {}",
        display_value(location.get("lat").unwrap_or(&Value::Null)),
        display_value(location.get("lng").unwrap_or(&Value::Null))
    )
}

/// A title that names a business rather than a detail-page tab
pub fn is_business_title(title: Option<&str>) -> bool {
    match title {
        Some(t) if !t.is_empty() => !GENERIC_TITLES.contains(&t.to_lowercase().as_str()),
        _ => false,
    }
}

/// Number of sections in `additionalInfo`, zero when it is not an object
pub fn additional_info_categories(place: &Value) -> usize {
    place
        .get("additionalInfo")
        .and_then(Value::as_object)
        .map_or(0, |m| m.len())
}

/// Keys of a map whose values are truthy
pub fn truthy_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|m| {
            m.iter()
                .filter(|(_, v)| truthy(Some(v)))
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Display helpers
// ============================================================================

/// Strings unquoted, `None` for null, compact JSON otherwise
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cut to `limit` characters, appending `...` when something was cut
pub fn truncate_display(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}

fn display_or_none(value: Option<&Value>, limit: usize) -> String {
    if truthy(value) {
        truncate_display(&display_value(value.unwrap_or(&Value::Null)), limit)
    } else {
        "None".to_string()
    }
}

// ============================================================================
// Field tables
// ============================================================================

/// How a field is judged populated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Generic presence check
    Plain,
    /// `location` object with coordinates
    Coordinates(CoordinateRule),
    /// Map of platform -> link; valid when any link is set
    LinkMap,
    /// Map of day -> hours; valid when any day has hours
    HoursMap,
    /// Array of photo entries
    PhotoList,
}

/// One row of a field table
#[derive(Debug, Clone, Copy)]
pub struct FieldCheck {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldCheck {
    pub const fn plain(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            kind: FieldKind::Plain,
        }
    }

    pub const fn with_kind(field: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { field, label, kind }
    }
}

/// Result of checking one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldVerdict {
    pub field: &'static str,
    pub label: &'static str,
    pub valid: bool,
    pub display: String,
}

impl FieldVerdict {
    pub fn line(&self) -> String {
        let mark = if self.valid { "✅" } else { "❌" };
        format!("   {mark} {}: {}", self.label, self.display)
    }
}

/// Check every row of `checks` against `place`
///
/// `display_limit` caps the length of the shown value for plain fields.
pub fn analyze_fields(place: &Value, checks: &[FieldCheck], display_limit: usize) -> Vec<FieldVerdict> {
    checks
        .iter()
        .map(|check| {
            let value = place.get(check.field);
            let (valid, display) = match (check.kind, value) {
                (FieldKind::Coordinates(rule), _) => {
                    let valid = has_coordinates(place, rule);
                    let display = if valid {
                        coordinates_display(place)
                    } else {
                        display_value(value.unwrap_or(&Value::Null))
                    };
                    (valid, display)
                }
                (FieldKind::LinkMap, Some(v)) if v.is_object() => {
                    let links = truthy_keys(v);
                    if links.is_empty() {
                        (false, "None".to_string())
                    } else {
                        (true, format!("{} platforms: {:?}", links.len(), links))
                    }
                }
                (FieldKind::HoursMap, Some(v)) if v.is_object() => {
                    let days = truthy_keys(v).len();
                    if days > 0 {
                        (true, format!("{days} days with hours"))
                    } else {
                        (false, "None".to_string())
                    }
                }
                (FieldKind::PhotoList, Some(Value::Array(items))) => {
                    if items.is_empty() {
                        (false, "None".to_string())
                    } else {
                        (true, format!("{} photos", items.len()))
                    }
                }
                _ => (is_populated(value), display_or_none(value, display_limit)),
            };

            FieldVerdict {
                field: check.field,
                label: check.label,
                valid,
                display,
            }
        })
        .collect()
}

/// Valid count over total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub valid: usize,
    pub total: usize,
}

impl Tally {
    pub fn of(verdicts: &[FieldVerdict]) -> Self {
        Self {
            valid: verdicts.iter().filter(|v| v.valid).count(),
            total: verdicts.len(),
        }
    }

    pub fn rate(&self) -> f64 {
        crate::report::success_rate(self.valid, self.total)
    }
}

/// Which of the expected keys a place carries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coverage {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl Coverage {
    pub fn percent(&self) -> f64 {
        crate::report::success_rate(self.present.len(), self.present.len() + self.missing.len())
    }
}

/// Split `expected` into keys present and absent in `place` (value ignored)
pub fn field_coverage(place: &Value, expected: &[&str]) -> Coverage {
    let mut coverage = Coverage::default();
    for field in expected {
        if place.get(*field).is_some() {
            coverage.present.push((*field).to_string());
        } else {
            coverage.missing.push((*field).to_string());
        }
    }
    coverage
}

// ============================================================================
// Sample printouts
// ============================================================================

/// Field groups of the sectioned sample printout
pub const SAMPLE_SECTIONS: &[(&str, &[&str])] = &[
    ("Basic Info", &["title", "categoryName", "price"]),
    ("Address", &["address", "street", "city", "state", "postalCode"]),
    ("Contact", &["phone", "website"]),
    ("Location", &["location"]),
    ("Ratings", &["totalScore", "reviewsCount"]),
    ("Additional Info", &["additionalInfo"]),
    ("Social Media", &["socialMedia"]),
    ("Meta", &["placeId", "scrapedAt"]),
];

/// Render the sectioned sample; large maps and arrays are summarized
pub fn render_sample(place: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    for (section, fields) in SAMPLE_SECTIONS {
        lines.push(format!("\n   {section}:"));
        for field in *fields {
            let Some(value) = place.get(*field) else {
                continue;
            };
            let line = match value {
                Value::Object(map) if map.len() > 3 => {
                    let keys: Vec<&String> = map.keys().take(3).collect();
                    format!("     {field}: {} items - {keys:?}...", map.len())
                }
                Value::Array(items) if items.len() > 3 => {
                    let head: Vec<String> = items.iter().take(3).map(display_value).collect();
                    format!("     {field}: {} items - {head:?}...", items.len())
                }
                other => format!("     {field}: {}", display_value(other)),
            };
            lines.push(line);
        }
    }
    lines
}

/// Alphabetized `NN. key: value` listing
///
/// Values are shown in [`repr_value`] form; a map or list whose rendering
/// exceeds 100 characters is summarized as `dict (n)` / `list (n)`.
pub fn field_listing(place: &Value) -> Vec<String> {
    let Some(map) = place.as_object() else {
        return Vec::new();
    };

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    keys.into_iter()
        .enumerate()
        .map(|(i, key)| {
            let value = &map[key.as_str()];
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => repr_value(other),
            };
            match value {
                Value::Object(m) if rendered.chars().count() > 100 => {
                    format!("{:2}. {key}: dict ({})", i + 1, m.len())
                }
                Value::Array(a) if rendered.chars().count() > 100 => {
                    format!("{:2}. {key}: list ({})", i + 1, a.len())
                }
                _ => format!("{:2}. {key}: {rendered}", i + 1),
            }
        })
        .collect()
}

/// Literal form: `'quoted'` strings, `True`/`False`/`None`, `, ` and `: ` separators
pub fn repr_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => repr_str(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(repr_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", repr_str(k), repr_value(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn repr_str(s: &str) -> String {
    // double quotes only when that avoids escaping
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
