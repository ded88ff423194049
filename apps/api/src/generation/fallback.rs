//! Fallback Generator: deterministic template copy, no external calls.
//!
//! Output goes through the same `ContractEnforcer::finish` tail as generated copy, so the
//! bundle obeys the same contract whichever path produced it.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::catalog::{Category, CategoryPolicy};
use crate::contract::long_form::{generic_lifestyle, LongForm};
use crate::contract::meta::{capitalize_first, filler_sentence, word_count};
use crate::contract::spec_lines::{build_spec_lines, ensure_period, format_capacity, format_power};
use crate::contract::{short_form, ContractEnforcer};
use crate::models::{present, DescriptionBundle, ProductFacts};

/// A size token in the product name, e.g. "20cm" or "8 in".
static NAME_DIMENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:\.\d+)?)\s?(cm|mm|in)\b").unwrap()
});

const MAX_HIGHLIGHTED_FEATURES: usize = 3;

pub struct FallbackGenerator {
    enforcer: Arc<ContractEnforcer>,
}

impl FallbackGenerator {
    pub fn new(enforcer: Arc<ContractEnforcer>) -> Self {
        Self { enforcer }
    }

    /// Always succeeds; identical input gives identical output.
    pub fn generate(&self, product: &ProductFacts, policy: &CategoryPolicy) -> DescriptionBundle {
        debug!("Building fallback copy for '{}' ({})", product.name, policy.category);

        let short = short_form::build(short_fragments(product, policy), policy, self.enforcer.limits());
        let form = long_form(product, policy, &self.enforcer);

        self.enforcer.finish(short, form, product, policy).0
    }
}

fn short_fragments(product: &ProductFacts, policy: &CategoryPolicy) -> Vec<String> {
    let mut fragments = Vec::new();

    if policy.category == Category::Electricals {
        if let Some(power) = allowed_spec(product, policy, "powerW").and_then(|p| format_power(&p)) {
            fragments.push(format!("{} power", power.trim_end_matches('.')));
        }
        if let Some(capacity) = allowed_spec(product, policy, "capacity") {
            fragments.push(format!("{} capacity", format_capacity(&capacity).trim_end_matches('.')));
        }
        return fragments;
    }

    if let Some(material) = allowed_spec(product, policy, "material") {
        fragments.push(material_fragment(&material));
    }
    if let Some(token) = name_dimension(&product.name) {
        if policy.category == Category::KnivesCutlery {
            fragments.push(format!("{token} blade"));
        } else if policy.allows("dimensions") {
            fragments.push(format!("{token} size"));
        }
    }
    if let Some(capacity) = allowed_spec(product, policy, "capacity") {
        fragments.push(format!("{} capacity", format_capacity(&capacity).trim_end_matches('.')));
    }
    if policy.allows("guarantee") {
        if product.is_non_stick {
            fragments.push("10-year guarantee included".to_string());
        } else if product.guarantee_text().is_some() {
            fragments.push("Includes guarantee".to_string());
        }
    }

    fragments
}

fn allowed_spec(product: &ProductFacts, policy: &CategoryPolicy, key: &str) -> Option<String> {
    policy.allows(key).then(|| product.spec_text(key)).flatten()
}

fn material_fragment(material: &str) -> String {
    let material = capitalize_first(material.trim());
    if word_count(&material) < 2 {
        format!("{material} construction")
    } else {
        material
    }
}

fn name_dimension(name: &str) -> Option<String> {
    NAME_DIMENSION
        .captures(name)
        .map(|c| format!("{}{}", &c[1], c[2].to_lowercase()))
}

fn long_form(product: &ProductFacts, policy: &CategoryPolicy, enforcer: &ContractEnforcer) -> LongForm {
    let features = product.clean_features();
    let highlighted = (!features.is_empty()).then(|| {
        let picked: Vec<&str> = features.iter().take(MAX_HIGHLIGHTED_FEATURES).copied().collect();
        format!("Key features include {}.", join_natural(&picked).trim_end_matches('.'))
    });

    let mut lifestyle = Vec::new();
    let mut technical = Vec::new();

    if policy.lifestyle_weight > 0 {
        lifestyle.push(generic_lifestyle(&product.name));
        let benefits: Vec<String> = product
            .clean_benefits()
            .iter()
            .map(|b| capitalize_first(&ensure_period(b)))
            .collect();
        let highlight: Vec<String> = highlighted.into_iter().chain(benefits).collect();
        if !highlight.is_empty() {
            lifestyle.push(highlight.join(" "));
        }
    } else if let Some(highlighted) = highlighted {
        technical.push(highlighted);
    }

    if let Some(material) = allowed_spec(product, policy, "material") {
        technical.push(format!("Made from {}.", material.trim().trim_end_matches('.')));
    }
    if let Some(programs) = allowed_spec(product, policy, "programs") {
        technical.push(format!("Settings include {}.", programs.trim_end_matches('.')));
    }
    if let Some(usage) = present(&product.usage) {
        technical.push(capitalize_first(&ensure_period(usage)));
    }

    let technical = if technical.is_empty() {
        // lifestyle-free categories still need one prose paragraph
        (policy.lifestyle_weight == 0).then(|| generic_lifestyle(&product.name))
    } else {
        Some(technical.join(" "))
    };

    LongForm {
        meta: enforcer.shaper().fit_window(&filler_sentence(&product.name)),
        lifestyle,
        technical,
        spec_lines: build_spec_lines(product, policy),
    }
}

/// "a", "a and b", "a, b and c".
fn join_natural(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
