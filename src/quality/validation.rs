//! Heuristic validations of a single scraped place
//!
//! Each check produces a [`Validation`] with a pass/fail verdict and a
//! human-readable message; the caller decides whether to record or print it.

use serde_json::Value;

use super::{
    has_coordinates, is_business_title, truncate_display, truthy, truthy_keys, CoordinateRule,
};

/// Street-type fragments accepted as evidence of a real address
const STREET_WORDS: &[&str] = &["st", "ave", "rd", "blvd", "dr"];

/// Field count of the scraper generation before the enhanced one
const PREVIOUS_FIELD_COUNT: f64 = 32.0;

/// Verdict on one aspect of a place
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub aspect: &'static str,
    pub success: bool,
    pub message: String,
}

impl Validation {
    fn new(aspect: &'static str, success: bool, message: impl Into<String>) -> Self {
        Self {
            aspect,
            success,
            message: message.into(),
        }
    }
}

fn str_field<'a>(place: &'a Value, field: &str) -> &'a str {
    place.get(field).and_then(Value::as_str).unwrap_or("")
}

fn count_truthy(place: &Value, fields: &[&str]) -> usize {
    fields.iter().filter(|f| truthy(place.get(**f))).count()
}

fn location_display(place: &Value) -> String {
    place
        .get("location")
        .map_or_else(|| "{}".to_string(), Value::to_string)
}

/// A populated address: longer than ten characters with a comma or a street word
pub fn is_real_address(address: &str) -> bool {
    if address.chars().count() <= 10 {
        return false;
    }
    let lower = address.to_lowercase();
    address.contains(',') || STREET_WORDS.iter().any(|w| lower.contains(w))
}

/// Checks that the scraper landed on the business detail page and read its core fields
pub fn validate_critical_fixes(place: &Value, is_business_page: bool) -> Vec<Validation> {
    let mut validations = Vec::with_capacity(6);
    let title = str_field(place, "title");

    validations.push(if is_business_page {
        Validation::new(
            "Navigation to Business Pages",
            true,
            format!(
                "✅ Successfully navigated to business detail page (title: '{}')",
                truncate_display(title, 50)
            ),
        )
    } else {
        Validation::new(
            "Navigation to Business Pages",
            false,
            format!("❌ Still extracting from search results (title: '{title}')"),
        )
    });

    let title_valid = is_business_title(Some(title)) && title.chars().count() > 3;
    validations.push(if title_valid {
        Validation::new(
            "Business Name Extraction",
            true,
            format!("✅ Valid business name extracted: '{}'", truncate_display(title, 50)),
        )
    } else {
        Validation::new(
            "Business Name Extraction",
            false,
            format!("❌ Invalid/generic title: '{title}' (indicates wrong page extraction)"),
        )
    });

    let address = str_field(place, "address");
    validations.push(if is_real_address(address) {
        Validation::new(
            "Address Extraction",
            true,
            format!("✅ Real address extracted: '{}'", truncate_display(address, 50)),
        )
    } else {
        Validation::new(
            "Address Extraction",
            false,
            format!("❌ No valid address extracted: '{address}'"),
        )
    });

    let phone = str_field(place, "phone");
    validations.push(if phone.chars().count() >= 10 {
        Validation::new("Phone Extraction", true, format!("✅ Phone number extracted: '{phone}'"))
    } else {
        Validation::new("Phone Extraction", false, "❌ No phone number extracted")
    });

    let website = str_field(place, "website");
    validations.push(if website.starts_with("http") {
        Validation::new(
            "Website Extraction",
            true,
            format!("✅ Website URL extracted: '{}'", truncate_display(website, 50)),
        )
    } else {
        Validation::new("Website Extraction", false, "❌ No website URL extracted")
    });

    validations.push(if has_coordinates(place, CoordinateRule::NonZero) {
        Validation::new(
            "Coordinates Extraction",
            true,
            format!("✅ Coordinates extracted: {}", coordinates_pair(place)),
        )
    } else {
        Validation::new(
            "Coordinates Extraction",
            false,
            format!("❌ No valid coordinates extracted: {}", location_display(place)),
        )
    });

    validations
}

/// Both coordinates set to anything truthy; `"0"` counts, `0` does not
fn has_truthy_coordinates(place: &Value) -> bool {
    place
        .get("location")
        .filter(|l| l.is_object())
        .is_some_and(|l| truthy(l.get("lat")) && truthy(l.get("lng")))
}

fn coordinates_pair(place: &Value) -> String {
    let location = place.get("location").unwrap_or(&Value::Null);
    let part = |key: &str| {
        location
            .get(key)
            .map_or_else(|| "None".to_string(), super::display_value)
    };
    format!("{}, {}", part("lat"), part("lng"))
}

/// Breadth checks on the enhanced scraper's output
///
/// `total_fields` is the recursive field count and `info_categories` the
/// number of `additionalInfo` sections, both computed by the caller.
pub fn validate_enhanced_data(
    place: &Value,
    total_fields: usize,
    info_categories: usize,
) -> Vec<Validation> {
    let mut validations = Vec::with_capacity(15);

    let title = str_field(place, "title");
    validations.push(if title.is_empty() {
        Validation::new("Basic Info", false, "No title extracted")
    } else {
        Validation::new(
            "Basic Info",
            true,
            format!("Title extracted: '{}'", truncate_display(title, 50)),
        )
    });

    let address_components = ["address", "street", "city", "state", "postalCode", "countryCode"];
    let address_found = count_truthy(place, &address_components);
    validations.push(Validation::new(
        "Enhanced Address",
        address_found >= 3,
        if address_found >= 3 {
            format!("Address breakdown: {address_found}/{} components", address_components.len())
        } else {
            format!(
                "Incomplete address breakdown: {address_found}/{} components",
                address_components.len()
            )
        },
    ));

    let contact_fields = ["phone", "phoneUnformatted", "website"];
    let contact_found = count_truthy(place, &contact_fields);
    validations.push(Validation::new(
        "Enhanced Contact",
        contact_found >= 2,
        if contact_found >= 2 {
            format!("Contact info: {contact_found}/{} fields", contact_fields.len())
        } else {
            format!("Limited contact info: {contact_found}/{} fields", contact_fields.len())
        },
    ));

    validations.push(if has_coordinates(place, CoordinateRule::KeysPresent) {
        Validation::new(
            "Enhanced Coordinates",
            true,
            format!("Coordinates: {}", coordinates_pair(place)),
        )
    } else {
        Validation::new(
            "Enhanced Coordinates",
            false,
            "No coordinates extracted (enhanced extraction failed)",
        )
    });

    let rating_fields = ["totalScore", "reviewsCount", "imagesCount"];
    let rating_found = rating_fields
        .iter()
        .filter(|f| place.get(**f).is_some_and(|v| !v.is_null()))
        .count();
    validations.push(Validation::new(
        "Enhanced Ratings",
        rating_found >= 2,
        if rating_found >= 2 {
            format!("Rating data: {rating_found}/{} fields", rating_fields.len())
        } else {
            format!("Limited rating data: {rating_found}/{} fields", rating_fields.len())
        },
    ));

    let additional_info = place.get("additionalInfo").and_then(Value::as_object);
    let info_sections = additional_info.map_or(0, |m| m.len());
    validations.push(if info_sections >= 3 {
        let names: Vec<&String> = additional_info
            .map(|m| m.keys().take(3).collect())
            .unwrap_or_default();
        Validation::new(
            "Enhanced Additional Info",
            true,
            format!("Multiple categories: {info_sections} sections ({names:?}...)"),
        )
    } else {
        Validation::new(
            "Enhanced Additional Info",
            false,
            format!("Limited additional info: {info_sections} categories"),
        )
    });

    validations.push(opening_hours_validation(place, "Enhanced Opening Hours", true));
    validations.push(social_media_validation(place, "Social Media Links", false));

    let id_fields = ["placeId", "fid", "cid", "kgmid"];
    let id_found = count_truthy(place, &id_fields);
    validations.push(Validation::new(
        "Enhanced IDs",
        id_found >= 2,
        if id_found >= 2 {
            format!("Place IDs: {id_found}/{} types", id_fields.len())
        } else {
            format!("Limited place IDs: {id_found}/{} types", id_fields.len())
        },
    ));

    validations.push(if total_fields >= 45 {
        Validation::new(
            "Field Count Target",
            true,
            format!("Excellent field count: {total_fields} fields (vs 36 in previous version)"),
        )
    } else if total_fields >= 40 {
        Validation::new(
            "Field Count Target",
            true,
            format!("Good field count: {total_fields} fields (improvement over 36)"),
        )
    } else {
        Validation::new(
            "Field Count Target",
            false,
            format!("Below target: {total_fields} fields (target: 45-55)"),
        )
    });

    validations.push(if has_truthy_coordinates(place) {
        Validation::new(
            "Coordinates Extraction",
            true,
            format!(
                "✅ Coordinates: {} (aria-label method working)",
                coordinates_pair(place)
            ),
        )
    } else {
        Validation::new(
            "Coordinates Extraction",
            false,
            "❌ No coordinates extracted (aria-label method failed)",
        )
    });

    validations.push(if info_categories >= 8 {
        Validation::new(
            "Additional Info Categories",
            true,
            format!("✅ Excellent: {info_categories} categories (vs 2 previous)"),
        )
    } else if info_categories >= 5 {
        Validation::new(
            "Additional Info Categories",
            true,
            format!("✅ Good improvement: {info_categories} categories (vs 2 previous)"),
        )
    } else {
        Validation::new(
            "Additional Info Categories",
            false,
            format!("❌ Limited: {info_categories} categories (target: 8+, previous: 2)"),
        )
    });

    validations.push(social_media_validation(place, "Social Media Extraction", true));
    validations.push(opening_hours_validation(place, "Opening Hours", false));

    let improvement = (total_fields as f64 - PREVIOUS_FIELD_COUNT) / PREVIOUS_FIELD_COUNT * 100.0;
    validations.push(if total_fields >= 45 {
        Validation::new(
            "Field Count Improvement",
            true,
            format!("✅ Excellent: {total_fields} fields ({improvement:+.1}% vs 32 previous)"),
        )
    } else if total_fields >= 40 {
        Validation::new(
            "Field Count Improvement",
            true,
            format!("✅ Good: {total_fields} fields ({improvement:+.1}% vs 32 previous)"),
        )
    } else {
        Validation::new(
            "Field Count Improvement",
            false,
            format!("❌ Limited improvement: {total_fields} fields ({improvement:+.1}% vs 32 previous)"),
        )
    });

    validations
}

/// Opening hours must be a non-empty array; `strict` also requires `hours` next to `day`
fn opening_hours_validation(place: &Value, aspect: &'static str, strict: bool) -> Validation {
    let Some(entries) = place
        .get("openingHours")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
    else {
        let message = if strict {
            "No opening hours extracted"
        } else {
            "❌ No opening hours extracted"
        };
        return Validation::new(aspect, false, message);
    };

    let has_structure = entries
        .iter()
        .any(|h| h.get("day").is_some() && (!strict || h.get("hours").is_some()));
    let shape = match (has_structure, strict) {
        (true, true) => "with day/hours structure",
        (true, false) => "with day structure",
        (false, _) => "(basic format)",
    };
    let message = if strict {
        format!("Opening hours: {} entries {shape}", entries.len())
    } else {
        format!("✅ Hours: {} entries {shape}", entries.len())
    };
    Validation::new(aspect, has_structure, message)
}

fn social_media_validation(place: &Value, aspect: &'static str, marked: bool) -> Validation {
    let (ok, fail) = if marked { ("✅ ", "❌ ") } else { ("", "") };
    match place.get("socialMedia") {
        Some(social) if social.is_object() => {
            let links = truthy_keys(social);
            if links.is_empty() {
                Validation::new(
                    aspect,
                    false,
                    format!("{fail}No social media links extracted from business website"),
                )
            } else {
                Validation::new(aspect, true, format!("{ok}Social media found: {links:?}"))
            }
        }
        _ => Validation::new(
            aspect,
            false,
            if marked {
                "❌ Social media object missing".to_string()
            } else {
                "Social media object missing or invalid".to_string()
            },
        ),
    }
}
