//! SEO meta adjuster.
//!
//! Pads, truncates and keyword-injects a meta description so it lands in the
//! configured character window and, where it fits, mentions at least one keyword.

pub mod keywords;

use std::sync::Arc;

use serde::Serialize;

use crate::contract::meta::{
    char_len, finish_terminal, sentence_body, take_chars, trim_dangling, MetaShaper,
};
use crate::rules::ContentRules;
use crate::sanitize::strip_tags;

pub use keywords::extract_keywords;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaIssue {
    Empty,
    MetaTooShort,
    MetaTooLong,
    NoKeywords,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaReport {
    pub original: String,
    pub fixed: String,
    pub fixed_length: usize,
    pub issues: Vec<MetaIssue>,
    pub keywords_present: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MetaAdjuster {
    rules: Arc<ContentRules>,
    shaper: MetaShaper,
}

impl MetaAdjuster {
    pub fn new(rules: Arc<ContentRules>) -> Self {
        let shaper = MetaShaper::new(&rules);
        Self { rules, shaper }
    }

    pub fn validate_and_fix(&self, meta: &str, product_name: &str, keywords: &[String]) -> MetaReport {
        let limits = self.shaper.limits();
        let usable = self.usable_keywords(keywords);
        let mut issues = Vec::new();

        let cleaned = trim_dangling(&sentence_body(&strip_tags(meta)));
        let mut text = if cleaned.is_empty() {
            issues.push(MetaIssue::Empty);
            let name = Some(product_name.trim()).filter(|n| !n.is_empty()).unwrap_or("product");
            format!("The {name} is designed for everyday use.")
        } else {
            finish_terminal(&cleaned)
        };

        let len = char_len(&text);
        if len < limits.meta_min_chars {
            issues.push(MetaIssue::MetaTooShort);
            text = self.pad(&text, &usable);
        } else if len > limits.meta_max_chars {
            issues.push(MetaIssue::MetaTooLong);
            text = truncate_smart(&text, limits.meta_max_chars);
            if char_len(&text) < limits.meta_min_chars {
                text = self.pad(&text, &usable);
            }
        }

        let mut present = keywords_in(&text, &usable);
        if present.is_empty() && !usable.is_empty() {
            issues.push(MetaIssue::NoKeywords);
            if let Some(injected) = self.inject(&text, &usable[0]) {
                text = injected;
                present = keywords_in(&text, &usable);
            }
        }

        MetaReport {
            original: meta.to_string(),
            fixed_length: char_len(&text),
            fixed: text,
            issues,
            keywords_present: present,
        }
    }

    /// Trimmed, non-banned, de-duplicated keywords in their original order.
    fn usable_keywords(&self, keywords: &[String]) -> Vec<String> {
        let mut usable: Vec<String> = Vec::new();
        for keyword in keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
            if self.rules.is_banned_keyword(keyword)
                || usable.iter().any(|u| u.eq_ignore_ascii_case(keyword))
            {
                continue;
            }
            usable.push(keyword.to_string());
        }
        usable
    }

    /// Adds up to two missing keywords, then neutral clauses, until the minimum is met.
    fn pad(&self, text: &str, keywords: &[String]) -> String {
        let limits = self.shaper.limits();
        let body = trim_dangling(&sentence_body(text));
        let missing: Vec<&String> = keywords
            .iter()
            .filter(|k| !contains_ci(&body, k))
            .take(2)
            .collect();

        let candidates = match missing.as_slice() {
            [first, second] => vec![
                format!("{body} with {first} and {second}"),
                format!("{body} with {first}"),
            ],
            [only] => vec![format!("{body} with {only}")],
            _ => Vec::new(),
        };
        let padded = candidates
            .into_iter()
            .find(|c| char_len(c) < limits.meta_max_chars)
            .unwrap_or(body);

        let sentence = finish_terminal(&padded);
        if char_len(&sentence) < limits.meta_min_chars {
            self.shaper.extend(&sentence)
        } else {
            sentence
        }
    }

    fn inject(&self, text: &str, keyword: &str) -> Option<String> {
        let body = sentence_body(text);
        ["with", "for"]
            .iter()
            .map(|connector| format!("{body} {connector} {keyword}."))
            .find(|candidate| char_len(candidate) <= self.shaper.limits().meta_max_chars)
    }
}

/// Cuts at a sentence end past 75% of `max`, else a word boundary past 85%, else a
/// hard cut. The ellipsis the cut would leave collapses into the terminal period.
fn truncate_smart(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let cut = take_chars(text, max);

    let sentence_end = cut.char_indices().filter(|&(idx, c)| {
        c == '.' && text[idx + 1..].chars().next().map_or(true, char::is_whitespace)
    });
    if let Some((idx, _)) = sentence_end.last() {
        if char_len(&cut[..idx]) > max * 3 / 4 {
            return finish_terminal(&cut[..=idx]);
        }
    }

    if let Some(idx) = cut.rfind(' ') {
        if char_len(&cut[..idx]) > max * 85 / 100 {
            return finish_terminal(&trim_dangling(&cut[..idx]));
        }
    }

    finish_terminal(&trim_dangling(take_chars(text, max.saturating_sub(3))))
}

fn contains_ci(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

fn keywords_in(text: &str, keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| contains_ci(text, k))
        .cloned()
        .collect()
}
