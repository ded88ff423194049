//! Content rules: the configurable half of the copy contract.
//!
//! Loaded once at startup (built-in defaults, optionally overridden by a JSON file at
//! `CONTENT_RULES_PATH`) and shared read-only behind an `Arc` by every pipeline stage.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::PolicySpec;

/// Character and word budgets for the three description fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Short block ceiling, markup included.
    pub short_max_chars: usize,
    pub fragment_min_words: usize,
    pub fragment_max_words: usize,
    pub meta_min_chars: usize,
    pub meta_max_chars: usize,
    pub meta_ideal_chars: usize,
    /// Long block ceiling, markup included.
    pub long_max_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            short_max_chars: 150,
            fragment_min_words: 2,
            fragment_max_words: 8,
            meta_min_chars: 150,
            meta_max_chars: 160,
            meta_ideal_chars: 155,
            long_max_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentRules {
    pub limits: Limits,
    /// Brand/provenance phrases removed from every field.
    pub forbidden_phrases: Vec<String>,
    /// Terms never used as SEO keywords.
    pub banned_keywords: Vec<String>,
    /// Retail vocabulary stripped from the meta paragraph only.
    pub retail_terms: Vec<String>,
    /// Replaces the built-in category table when present.
    pub categories: Option<Vec<PolicySpec>>,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            forbidden_phrases: to_strings(&[
                "Harts of Stur",
                "Since 1919",
                "Since 1990",
                "Dorset",
                "family-run",
                "family run",
                "imported from",
            ]),
            banned_keywords: to_strings(&[
                "shop", "shops", "shopping", "product", "products", "buy", "order", "orders",
                "price", "prices", "sale", "deals", "delivery", "ship", "shipping", "range",
                "style", "styles", "often", "comparable", "organic", "discover", "quality",
                "featuring", "feature", "features", "place", "mats", "unknown", "every",
            ]),
            retail_terms: to_strings(&[
                "shop", "shops", "shopping", "buy", "order", "orders", "price", "prices",
                "delivery", "shipping", "sale",
            ]),
            categories: None,
        }
    }
}

impl ContentRules {
    /// Loads rules from `path` if given, otherwise returns the built-in defaults.
    /// Fields missing from the file keep their default values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content rules from {}", path.display()))?;
        let rules: ContentRules = serde_json::from_str(&raw)
            .with_context(|| format!("Content rules at {} are not valid JSON", path.display()))?;

        if rules.limits.meta_min_chars > rules.limits.meta_max_chars {
            anyhow::bail!(
                "meta_min_chars ({}) exceeds meta_max_chars ({})",
                rules.limits.meta_min_chars,
                rules.limits.meta_max_chars
            );
        }

        Ok(rules)
    }

    pub fn is_banned_keyword(&self, keyword: &str) -> bool {
        let lower = keyword.trim().to_lowercase();
        lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
            .chain(std::iter::once(lower.as_str()))
            .any(|w| self.banned_keywords.iter().any(|b| b.eq_ignore_ascii_case(w)))
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_limits() {
        let limits = Limits::default();
        assert_eq!(limits.short_max_chars, 150);
        assert_eq!((limits.meta_min_chars, limits.meta_max_chars), (150, 160));
        assert_eq!(limits.long_max_chars, 2000);
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let rules = ContentRules::load(None).unwrap();
        assert!(rules.forbidden_phrases.iter().any(|p| p == "Since 1919"));
        assert!(rules.categories.is_none());
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"limits": {{"long_max_chars": 1500}}, "retail_terms": ["bargain"]}}"#).unwrap();

        let rules = ContentRules::load(Some(file.path())).unwrap();
        assert_eq!(rules.limits.long_max_chars, 1500);
        assert_eq!(rules.limits.short_max_chars, 150);
        assert_eq!(rules.retail_terms, vec!["bargain".to_string()]);
        assert!(!rules.banned_keywords.is_empty());
    }

    #[test]
    fn test_load_rejects_inverted_meta_window() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"limits": {{"meta_min_chars": 170}}}}"#).unwrap();
        assert!(ContentRules::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_banned_keyword_matches_whole_words() {
        let rules = ContentRules::default();
        assert!(rules.is_banned_keyword("Shop"));
        assert!(rules.is_banned_keyword("kitchen shop"));
        assert!(!rules.is_banned_keyword("everyday"));
        assert!(!rules.is_banned_keyword("stainless steel"));
    }
}
