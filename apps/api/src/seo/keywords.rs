use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{Category, CategoryPolicy};
use crate::models::{present, ProductFacts};
use crate::rules::ContentRules;
use crate::sanitize::Sanitizer;

const MAX_KEYWORDS: usize = 5;
const FEATURES_SCANNED: usize = 3;
const WORDS_PER_FEATURE: usize = 2;

static CAPITALISED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]{2,}\b").unwrap());

/// Keywords drawn from search hints, then brand, material, range and capitalised
/// feature words. Material counts only when the category allows it.
///
/// Banned terms, category names and anything the sanitizer would strip are skipped;
/// keeps at most five, each 3–30 characters.
pub fn extract_keywords(
    product: &ProductFacts,
    policy: &CategoryPolicy,
    rules: &ContentRules,
    sanitizer: &Sanitizer,
) -> Vec<String> {
    let mut candidates: Vec<String> = product
        .clean_serp_keywords()
        .into_iter()
        .map(str::to_string)
        .collect();
    candidates.extend(present(&product.brand).map(str::to_string));
    if policy.allows("material") {
        candidates.extend(product.material());
    }
    candidates.extend(present(&product.range).map(str::to_string));

    for feature in product.clean_features().into_iter().take(FEATURES_SCANNED) {
        candidates.extend(
            CAPITALISED_WORD
                .find_iter(feature)
                .take(WORDS_PER_FEATURE)
                .map(|m| m.as_str().to_string()),
        );
    }

    let mut keywords: Vec<String> = Vec::new();
    for candidate in candidates {
        let keyword = candidate.trim();
        let len = keyword.chars().count();
        if !(3..=30).contains(&len)
            || rules.is_banned_keyword(keyword)
            || is_category_name(keyword, product)
            || sanitizer.would_alter(keyword)
            || keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword))
        {
            continue;
        }
        keywords.push(keyword.to_string());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

fn is_category_name(keyword: &str, product: &ProductFacts) -> bool {
    Category::ALL.iter().any(|c| c.name().eq_ignore_ascii_case(keyword))
        || present(&product.category).is_some_and(|c| c.eq_ignore_ascii_case(keyword))
}
