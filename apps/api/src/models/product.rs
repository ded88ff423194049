use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Category;
use crate::contract::ValidationOutcome;

/// Raw product facts handed over by an upstream extractor (PDF, OCR, scraper, manual entry).
/// Immutable input to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFacts {
    pub id: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "collection")]
    pub range: Option<String>,
    #[serde(alias = "color")]
    pub colour: Option<String>,
    pub pattern: Option<String>,
    pub style: Option<String>,
    pub finish: Option<String>,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    /// Free-form until filtered against the category allow-list.
    pub specifications: BTreeMap<String, Value>,
    pub is_non_stick: bool,
    pub care: Option<String>,
    pub usage: Option<String>,
    pub audience: Option<String>,
    #[serde(alias = "madeIn")]
    pub origin: Option<String>,
    pub guarantee: Option<String>,
    pub warranty: Option<String>,
    /// Search-result keywords from upstream research, most relevant first.
    #[serde(alias = "serp_keywords")]
    pub serp_keywords: Vec<String>,
    #[serde(alias = "serp_meta_seed")]
    pub serp_meta_seed: Option<String>,
}

impl ProductFacts {
    /// Specification value rendered as text; empty values count as absent.
    pub fn spec_text(&self, key: &str) -> Option<String> {
        self.specifications.get(key).and_then(value_text)
    }

    pub fn material(&self) -> Option<String> {
        self.spec_text("material")
    }

    /// Guarantee text from the dedicated fields first, then the specifications.
    pub fn guarantee_text(&self) -> Option<String> {
        present(&self.guarantee)
            .or_else(|| present(&self.warranty))
            .map(str::to_string)
            .or_else(|| self.spec_text("guarantee"))
            .or_else(|| self.spec_text("warranty"))
    }

    pub fn origin_text(&self) -> Option<String> {
        present(&self.origin)
            .map(str::to_string)
            .or_else(|| self.spec_text("origin"))
            .or_else(|| self.spec_text("madeIn"))
    }

    pub fn care_text(&self) -> Option<String> {
        present(&self.care)
            .map(str::to_string)
            .or_else(|| self.spec_text("care"))
    }

    /// Non-empty, trimmed features in their original order.
    pub fn clean_features(&self) -> Vec<&str> {
        clean_list(&self.features)
    }

    pub fn clean_benefits(&self) -> Vec<&str> {
        clean_list(&self.benefits)
    }

    pub fn clean_serp_keywords(&self) -> Vec<&str> {
        clean_list(&self.serp_keywords)
    }
}

#[cfg(test)]
impl ProductFacts {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Trimmed value of an optional field, `None` when blank.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn clean_list(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Bool(_) | Value::Null | Value::Object(_) => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline output
// ────────────────────────────────────────────────────────────────────────────

/// The three retailer-facing description fields. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionBundle {
    pub short_description: String,
    pub meta_description: String,
    pub long_description: String,
}

impl DescriptionBundle {
    /// Visible marker for a product whose generation could not complete.
    pub fn error_placeholder() -> Self {
        Self {
            short_description: "<p>Processing error occurred</p>".to_string(),
            meta_description: "Product description generation failed.".to_string(),
            long_description: "<p>Product description generation failed.</p>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionSource {
    Generated,
    Fallback,
    Failed,
}

/// A product with its description bundle attached, ready for export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedProduct {
    pub id: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub category: Category,
    /// Only the keys allowed for `category`.
    pub specifications: BTreeMap<String, Value>,
    pub features: Vec<String>,
    pub descriptions: DescriptionBundle,
    pub source: DescriptionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserializes_camel_case_and_aliases() {
        let facts: ProductFacts = serde_json::from_value(json!({
            "name": "Pro Frying Pan",
            "isNonStick": true,
            "collection": "Chef Series",
            "color": "Graphite",
            "madeIn": "England",
            "specifications": {"capacity": 2.5, "material": "Aluminium"}
        }))
        .unwrap();

        assert!(facts.is_non_stick);
        assert_eq!(facts.range.as_deref(), Some("Chef Series"));
        assert_eq!(facts.colour.as_deref(), Some("Graphite"));
        assert_eq!(facts.origin_text().as_deref(), Some("England"));
        assert_eq!(facts.spec_text("capacity").as_deref(), Some("2.5"));
    }

    #[test]
    fn test_serp_hints_accept_both_spellings() {
        let camel: ProductFacts = serde_json::from_value(json!({
            "name": "Stockpot",
            "serpKeywords": ["induction stockpot", " "],
            "serpMetaSeed": "Large stockpot for batch cooking"
        }))
        .unwrap();
        assert_eq!(camel.clean_serp_keywords(), vec!["induction stockpot"]);
        assert_eq!(camel.serp_meta_seed.as_deref(), Some("Large stockpot for batch cooking"));

        let snake: ProductFacts = serde_json::from_value(json!({
            "name": "Stockpot",
            "serp_keywords": ["stainless stockpot"],
            "serp_meta_seed": "Seed"
        }))
        .unwrap();
        assert_eq!(snake.clean_serp_keywords(), vec!["stainless stockpot"]);
        assert_eq!(snake.serp_meta_seed.as_deref(), Some("Seed"));
    }

    #[test]
    fn test_missing_name_defaults_to_empty() {
        let facts: ProductFacts = serde_json::from_value(json!({"sku": "ABC-1"})).unwrap();
        assert!(facts.name.is_empty());
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let mut facts = ProductFacts::named("Mug");
        facts.guarantee = Some("   ".to_string());
        facts
            .specifications
            .insert("guarantee".to_string(), json!("2 year guarantee"));
        facts.specifications.insert("material".to_string(), json!(""));

        assert_eq!(facts.guarantee_text().as_deref(), Some("2 year guarantee"));
        assert_eq!(facts.material(), None);
    }

    #[test]
    fn test_array_specs_join_as_text() {
        let mut facts = ProductFacts::named("Blender");
        facts
            .specifications
            .insert("programs".to_string(), json!(["Pulse", "Smoothie", 3]));
        assert_eq!(facts.spec_text("programs").as_deref(), Some("Pulse, Smoothie, 3"));
    }

    #[test]
    fn test_bundle_serializes_camel_case() {
        let value = serde_json::to_value(DescriptionBundle::error_placeholder()).unwrap();
        assert!(value.get("shortDescription").is_some());
        assert!(value.get("metaDescription").is_some());
        assert!(value.get("longDescription").is_some());
    }
}
