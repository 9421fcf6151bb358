//! Address cleanup before geocoding.
//!
//! User-typed addresses often carry an apartment or unit designator
//! (`"123 Main St Apt 4B"`, `"123 Main St #4B"`). Units live on the
//! report, not the building, and geocoders match better without them.

use regex::Regex;
use std::sync::LazyLock;

use crate::AddressInput;

/// Trailing unit designator: "Apt 4B", "Unit 3", "Suite 200", "#12".
///
/// Without a preceding comma the unit label must contain a digit, so
/// street names like "Suite Ave" or "Apartment Row" are left intact.
static UNIT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:",
        r"\s*,\s*(?:\b(?:apt|apartment|unit|suite|ste|fl|floor)\.?\s+|#\s*)[\w-]+",
        r"|\s+(?:\b(?:apt|apartment|unit|suite|ste|fl|floor)\.?\s+|#\s*)[\w-]*\d[\w-]*",
        r")\s*$",
    ))
    .expect("valid regex")
});

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a trailing unit designator from a street address.
#[must_use]
pub fn strip_unit(street: &str) -> String {
    let street = normalize_whitespace(street);
    UNIT_SUFFIX_RE.replace(&street, "").trim().to_string()
}

/// Builds a one-line address (`"street, city, state zip"`) from whichever
/// components are present.
#[must_use]
pub fn one_line(input: &AddressInput) -> String {
    let mut parts = vec![input.street.clone()];

    if let Some(city) = input.city.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(city.trim().to_string());
    }

    let state_zip = [input.state.as_deref(), input.zip.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !state_zip.is_empty() {
        parts.push(state_zip);
    }

    parts.join(", ")
}
