//! Prompt Builder: product facts + category policy → immutable `GenerationRequest`.
//!
//! Only allow-listed specification keys and non-empty optional fields reach the model,
//! so the generator never sees placeholders it could echo back.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::catalog::{Category, CategoryPolicy, PolicyRegistry};
use crate::generation::prompts::{
    PRODUCT_DATA_PREFIX, PROMPT_VERSION, SERP_HINTS_LABEL, SYSTEM_PROMPT_TEMPLATE, USER_PROMPT_TEMPLATE,
};
use crate::models::{present, ProductFacts};
use crate::rules::ContentRules;

/// The filtered fact subset serialised into the user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFacts {
    pub name: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub benefits: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, Value>,
    /// Present only when true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_non_stick: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub care: Option<String>,
}

/// Search hints sent after the product JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerpHints {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_seed: Option<String>,
}

impl SerpHints {
    /// `None` when the product carries no usable keyword or seed.
    pub fn from_product(product: &ProductFacts) -> Option<Self> {
        let hints = Self {
            keywords: product.clean_serp_keywords().into_iter().map(str::to_string).collect(),
            meta_seed: present(&product.serp_meta_seed).map(str::to_string),
        };
        (!hints.keywords.is_empty() || hints.meta_seed.is_some()).then_some(hints)
    }

    fn render(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("\n{SERP_HINTS_LABEL}\n{json}")
    }
}

/// One product's model input. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    facts: PromptFacts,
    system: Arc<str>,
    user: String,
}

impl GenerationRequest {
    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn product_name(&self) -> &str {
        &self.facts.name
    }
}

/// Specification entries whose key passes `allowed` and whose value is not empty.
pub fn filter_specifications(
    specs: &BTreeMap<String, Value>,
    allowed: impl Fn(&str) -> bool,
) -> BTreeMap<String, Value> {
    specs
        .iter()
        .filter(|(key, value)| allowed(key) && !is_blank(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Renders the system prompt once and builds per-product requests from it.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: Arc<str>,
}

impl PromptBuilder {
    pub fn new(rules: &ContentRules, registry: &PolicyRegistry) -> Self {
        let limits = &rules.limits;
        let matrix: Vec<String> = registry.policies().iter().map(|p| p.matrix_line()).collect();
        let quoted = |items: &[String]| {
            items
                .iter()
                .map(|i| format!("\"{i}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let system = SYSTEM_PROMPT_TEMPLATE
            .replace("{forbidden_phrases}", &quoted(&rules.forbidden_phrases))
            .replace("{retail_terms}", &rules.retail_terms.join(", "))
            .replace("{short_max}", &limits.short_max_chars.to_string())
            .replace("{long_max}", &limits.long_max_chars.to_string())
            .replace("{meta_min}", &limits.meta_min_chars.to_string())
            .replace("{meta_max}", &limits.meta_max_chars.to_string())
            .replace("{fragment_min}", &limits.fragment_min_words.to_string())
            .replace("{fragment_max}", &limits.fragment_max_words.to_string())
            .replace("{category_matrix}", &matrix.join("\n"));

        debug!("Rendered system prompt {} ({} chars)", PROMPT_VERSION, system.len());
        Self {
            system: Arc::from(system),
        }
    }

    pub fn build(&self, product: &ProductFacts, policy: &CategoryPolicy) -> GenerationRequest {
        let owned = |field: &Option<String>| present(field).map(str::to_string);
        let gated = |key: &str, value: Option<String>| value.filter(|_| policy.allows(key));

        let facts = PromptFacts {
            name: product.name.trim().to_string(),
            category: policy.category,
            sku: owned(&product.sku),
            brand: owned(&product.brand),
            range: owned(&product.range),
            colour: owned(&product.colour),
            pattern: owned(&product.pattern),
            style: owned(&product.style),
            finish: owned(&product.finish),
            usage: owned(&product.usage),
            audience: owned(&product.audience),
            features: product.clean_features().into_iter().map(str::to_string).collect(),
            benefits: product.clean_benefits().into_iter().map(str::to_string).collect(),
            specifications: filter_specifications(&product.specifications, |key| policy.allows(key)),
            is_non_stick: product.is_non_stick.then_some(true),
            origin: gated("origin", product.origin_text()),
            guarantee: gated("guarantee", product.guarantee_text()),
            care: gated("care", product.care_text()),
        };

        // PromptFacts holds only strings, maps and JSON values
        let facts_json = serde_json::to_string_pretty(&facts).unwrap_or_default();
        let serp_hints = SerpHints::from_product(product)
            .map(|hints| hints.render())
            .unwrap_or_default();
        let user = USER_PROMPT_TEMPLATE
            .replace("{product_data_prefix}", PRODUCT_DATA_PREFIX)
            .replace("{category_line}", &policy.matrix_line())
            .replace("{serp_hints}", &serp_hints)
            .replace("{facts_json}", &facts_json);

        GenerationRequest {
            facts,
            system: Arc::clone(&self.system),
            user,
        }
    }
}
