//! Deterministic spec/closer lines for the tail of the long description.
//!
//! Each line is rebuilt from product data and gated by the category allow-list, so the
//! generator can never introduce a spec value the data does not carry.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::CategoryPolicy;
use crate::contract::meta::{capitalize_first, word_count};
use crate::models::ProductFacts;

/// Grouped thousands (`1,200`) or a plain number with a point or comma decimal (`25,5`).
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:[.,]\d+)?").unwrap()
});
static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:,\d{3})+(?:\.\d+)?$").unwrap());
/// Numbers in a comma-separated list, where the comma is never a decimal mark.
static LIST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static DIMENSION_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[x×*]").unwrap());
static PLAIN_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());

static UK_ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z])(?:uk|u\.k\.?|united kingdom|great britain|britain|england|scotland|wales|northern ireland)(?:$|[^a-z])",
    )
    .unwrap()
});
static ORIGIN_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:designed|not|outside|assembled|except|new\s+england|new\s+south\s+wales)\b")
        .unwrap()
});

static SPEC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:capacity|dimensions|size|weight|power|wattage|blade length|material|made in|origin|programmes?|programs?|guarantee|warranty)\s*:|^made in\b|^\d+[- ]year (?:guarantee|warranty)",
    )
    .unwrap()
});

const NON_STICK_GUARANTEE: &str = "10-year guarantee.";

/// Whether a plain-text paragraph reads as a spec line rather than prose.
pub fn is_spec_line(text: &str) -> bool {
    let text = text.trim();
    SPEC_LINE.is_match(text)
        || (word_count(text) <= 6 && {
            let lower = text.to_lowercase();
            lower.contains("guarantee") || lower.contains("warranty")
        })
}

/// Spec lines in display order: capacity, dimensions, weight, power, blade length,
/// origin, guarantee, care.
pub fn build_spec_lines(product: &ProductFacts, policy: &CategoryPolicy) -> Vec<String> {
    let mut lines = Vec::new();

    if policy.allows("capacity") {
        if let Some(capacity) = product.spec_text("capacity") {
            lines.push(format!("Capacity: {}", format_capacity(&capacity)));
        }
    }
    if policy.allows("dimensions") {
        if let Some(dims) = product.spec_text("dimensions").and_then(|d| format_dimensions(&d)) {
            lines.push(format!("Dimensions: {dims}"));
        }
    }
    if policy.allows("weight") {
        if let Some(weight) = product.spec_text("weight") {
            lines.push(format!("Weight: {}", with_unit(&weight, "kg")));
        }
    }
    if policy.allows("powerW") {
        if let Some(power) = product.spec_text("powerW").and_then(|p| format_power(&p)) {
            lines.push(format!("Power: {power}"));
        }
    }
    if policy.allows("bladeLength") {
        if let Some(blade) = product.spec_text("bladeLength") {
            lines.push(format!("Blade length: {}", with_unit(&blade, "cm")));
        }
    }
    if policy.allows("origin") {
        if let Some(line) = product.origin_text().and_then(|o| made_in_line(&o)) {
            lines.push(line.to_string());
        }
    }
    if policy.allows("guarantee") {
        if let Some(line) = guarantee_line(product) {
            lines.push(line);
        }
    }
    if policy.allows("care") {
        if let Some(care) = product.care_text() {
            lines.push(capitalize_first(&ensure_period(&care)));
        }
    }

    lines
}

/// Bare numbers are millilitres; values that already carry a unit keep it.
pub fn format_capacity(raw: &str) -> String {
    let value = raw.trim().to_lowercase();
    if PLAIN_NUMBER.is_match(&value) {
        format!("{value}ml.")
    } else {
        ensure_period(&value)
    }
}

/// `H x W x D` from the first three numbers, `None` when fewer are present.
///
/// With `x` separators each part contributes its first number, so `25,5 x 20 x 10`
/// reads the comma as a decimal mark. Without them commas only separate values.
pub fn format_dimensions(raw: &str) -> Option<String> {
    let parts: Vec<&str> = DIMENSION_SEPARATOR.split(raw).collect();
    let numbers: Vec<String> = if parts.len() >= 3 {
        parts.into_iter().filter_map(first_number).take(3).collect()
    } else {
        LIST_NUMBER
            .find_iter(raw)
            .map(|m| m.as_str().to_string())
            .take(3)
            .collect()
    };
    match numbers.as_slice() {
        [h, w, d] => Some(format!("{h}(H) x {w}(W) x {d}(D) cm.")),
        _ => None,
    }
}

pub fn format_power(raw: &str) -> Option<String> {
    first_number(raw).map(|n| format!("{n}W."))
}

/// First number in `raw` with thousands separators removed and a decimal comma
/// turned into a point.
fn first_number(raw: &str) -> Option<String> {
    let found = NUMBER.find(raw)?.as_str();
    if THOUSANDS.is_match(found) {
        Some(found.replace(',', ""))
    } else {
        Some(found.replace(',', "."))
    }
}

/// "Made in UK." only for unqualified UK origins.
pub fn made_in_line(origin: &str) -> Option<&'static str> {
    if ORIGIN_QUALIFIER.is_match(origin) {
        return None;
    }
    UK_ORIGIN.is_match(origin).then_some("Made in UK.")
}

pub fn guarantee_line(product: &ProductFacts) -> Option<String> {
    if product.is_non_stick {
        return Some(NON_STICK_GUARANTEE.to_string());
    }
    product
        .guarantee_text()
        .map(|g| capitalize_first(&ensure_period(&g)))
}

pub fn ensure_period(text: &str) -> String {
    let trimmed = text.trim().trim_end_matches(['.', ' ']);
    format!("{trimmed}.")
}

fn with_unit(raw: &str, unit: &str) -> String {
    let value = raw.trim();
    if PLAIN_NUMBER.is_match(value) {
        format!("{value}{unit}.")
    } else {
        ensure_period(value)
    }
}
