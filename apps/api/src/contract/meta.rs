//! Meta sentence shaping: single-sentence cleanup and the 150–160 character window.
//!
//! Shared by the long-content contract (paragraph 1), the fallback generator and the
//! SEO meta adjuster so all three produce the same kind of sentence.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{ContentRules, Limits};

/// Neutral clauses appended, in order, to bring a short sentence into the window.
const EXTENSION_CLAUSES: &[&str] = &[
    ", designed to make daily tasks simpler and more enjoyable",
    ", combining practical design with dependable results",
    ", with a thoughtful design that suits busy homes",
    ", offering dependable results day after day",
    ", made to fit easily into daily routines",
    ", a welcome addition to any home",
    ", built for regular use",
    ", easy to enjoy",
];

/// Short closing units (each at most 11 characters) that close the final gap.
const PADDING_UNITS: &[&str] = &[
    " at home",
    ", practical",
    ", reliable",
    ", versatile",
    ", durable",
    ", handy",
    ", sturdy",
    ", useful",
];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\s+|^)(?:and|or|with|including|for|to|that|which|are|is|was|were|the|a|an|of|in|by)\s*$",
    )
    .unwrap()
});
static TRAILING_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[–—-]+\s*$").unwrap());
static TRAILING_CLAUSE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,:;]+\s*$").unwrap());
static TERMINAL_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s.!?…]+$").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,;:!?])").unwrap());

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// First `n` characters of `text`.
pub fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The filler used whenever a meta sentence has to be produced from nothing.
pub fn filler_sentence(product_name: &str) -> String {
    format!("The {} provides reliable performance for everyday use.", product_name.trim())
}

/// Text up to and including the first sentence terminator that is followed by
/// whitespace and a capital letter or digit.
pub fn first_sentence(text: &str) -> &str {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    for (i, &(idx, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut j = i + 1;
        let mut saw_space = false;
        while j < chars.len() && chars[j].1.is_whitespace() {
            saw_space = true;
            j += 1;
        }
        if saw_space && j < chars.len() && (chars[j].1.is_uppercase() || chars[j].1.is_ascii_digit()) {
            return &text[..idx + c.len_utf8()];
        }
    }
    text
}

/// Removes trailing conjunctions, dashes and clause punctuation until none remain.
pub fn trim_dangling(text: &str) -> String {
    let mut current = text.trim().to_string();
    loop {
        let mut next = TRAILING_CONNECTOR.replace(&current, "").into_owned();
        next = TRAILING_DASH.replace(&next, "").into_owned();
        next = TRAILING_CLAUSE_PUNCT.replace(&next, "").into_owned();
        let next = next.trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// `text` without its terminal punctuation.
pub fn sentence_body(text: &str) -> String {
    TERMINAL_PUNCT.replace(text.trim(), "").into_owned()
}

/// Capitalised, exactly one terminal period. Does not drop extra sentences.
pub fn finish_terminal(text: &str) -> String {
    let body = sentence_body(&collapse_whitespace(text));
    if body.is_empty() {
        return String::new();
    }
    format!("{}.", capitalize_first(&body))
}

/// Collapses whitespace, keeps the first sentence, trims dangling connectors and ends
/// with exactly one period. Empty input stays empty.
pub fn finish_sentence(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let body = sentence_body(first_sentence(&collapsed));
    let body = trim_dangling(&body);
    if body.is_empty() {
        return String::new();
    }
    format!("{}.", capitalize_first(&body))
}

/// Mentions `brand` once in a meta sentence: as "{name} by {brand}" at the first
/// whole-word mention of the product name, otherwise before the terminal period. Sentences that
/// already name the brand come back unchanged.
pub fn weave_brand(meta: &str, brand: &str, product_name: &str) -> String {
    let meta = meta.trim();
    let brand = brand.trim();
    if meta.is_empty() || brand.is_empty() || mentions_word(meta, brand) {
        return meta.to_string();
    }

    let name = product_name.trim();
    let name_end = (!name.is_empty())
        .then(|| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).ok())
        .flatten()
        .and_then(|re| re.find(meta).map(|m| m.end()));
    match name_end {
        Some(end) => format!("{} by {brand}{}", &meta[..end], &meta[end..]),
        None => format!("{} by {brand}.", sentence_body(meta)),
    }
}

fn mentions_word(text: &str, word: &str) -> bool {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
        .map(|re| re.is_match(text))
        .unwrap_or_else(|_| text.to_lowercase().contains(&word.to_lowercase()))
}

// ────────────────────────────────────────────────────────────────────────────
// Window fitting
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MetaShaper {
    limits: Limits,
    retail: Option<Regex>,
}

impl MetaShaper {
    pub fn new(rules: &ContentRules) -> Self {
        let terms: Vec<String> = rules
            .retail_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        let retail = (!terms.is_empty())
            .then(|| Regex::new(&format!(r"(?i)\b(?:{})\b", terms.join("|"))).ok())
            .flatten();
        Self {
            limits: rules.limits.clone(),
            retail,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Removes retail vocabulary. Applied to the meta paragraph only.
    pub fn strip_retail_terms(&self, text: &str) -> String {
        let Some(retail) = &self.retail else {
            return text.to_string();
        };
        let stripped = retail.replace_all(text, "");
        let collapsed = collapse_whitespace(&stripped);
        SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1").into_owned()
    }

    pub fn in_window(&self, text: &str) -> bool {
        let len = char_len(text);
        len >= self.limits.meta_min_chars && len <= self.limits.meta_max_chars
    }

    /// Turns `text` into one sentence whose length lies inside the meta window.
    pub fn fit_window(&self, text: &str) -> String {
        let mut sentence = finish_sentence(text);
        if self.in_window(&sentence) {
            return sentence;
        }
        if char_len(&sentence) > self.limits.meta_max_chars {
            sentence = self.truncate_at_word(&sentence);
        }
        if char_len(&sentence) < self.limits.meta_min_chars {
            sentence = self.extend(&sentence);
        }
        sentence
    }

    /// Cuts at the last word boundary that leaves room for the terminal period.
    pub fn truncate_at_word(&self, sentence: &str) -> String {
        let body = sentence_body(sentence);
        let room = self.limits.meta_max_chars.saturating_sub(1);
        if char_len(&body) <= room {
            return finish_terminal(&body);
        }

        let prefix = take_chars(&body, room);
        let cut_mid_word = body[prefix.len()..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace());
        let at_word = match prefix.rfind(char::is_whitespace) {
            Some(idx) if cut_mid_word => &prefix[..idx],
            _ => prefix,
        };

        let trimmed = trim_dangling(at_word);
        let body = if trimmed.is_empty() { prefix.trim().to_string() } else { trimmed };
        finish_terminal(&body)
    }

    /// Appends neutral clauses, then short units, until the sentence reaches the minimum
    /// without passing the maximum.
    pub fn extend(&self, sentence: &str) -> String {
        let min = self.limits.meta_min_chars;
        let max = self.limits.meta_max_chars;
        let mut body = sentence_body(sentence);

        for clause in EXTENSION_CLAUSES {
            if char_len(&body) + 1 >= min {
                break;
            }
            if char_len(&body) + char_len(clause) + 1 <= max {
                body.push_str(clause);
            }
        }
        for unit in PADDING_UNITS {
            if char_len(&body) + 1 >= min {
                break;
            }
            if char_len(&body) + char_len(unit) + 1 <= max {
                body.push_str(unit);
            }
        }

        finish_terminal(&body)
    }
}
