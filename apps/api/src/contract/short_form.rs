//! Short description contract: `<p>A<br>B<br>C</p>`, three 2–8 word fragments with no
//! terminal periods, at most 150 characters including markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::CategoryPolicy;
use crate::contract::meta::{capitalize_first, char_len, collapse_whitespace, word_count};
use crate::rules::Limits;
use crate::sanitize::strip_tags;

const FRAGMENT_COUNT: usize = 3;

/// Used only when a policy's own fillers are exhausted or too long.
const LAST_RESORT_FRAGMENTS: &[&str] = &["Everyday essential", "Simple to use", "Practical design"];

/// Line breaks and block-level tags both separate candidate fragments.
static FRAGMENT_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(?:p|li|ul|ol|div)\b[^>]*>").unwrap()
});

/// Full check of the short block against the contract.
pub fn is_compliant(html: &str, limits: &Limits) -> bool {
    if char_len(html) > limits.short_max_chars {
        return false;
    }
    let Some(inner) = html.strip_prefix("<p>").and_then(|t| t.strip_suffix("</p>")) else {
        return false;
    };
    let fragments: Vec<&str> = inner.split("<br>").collect();
    fragments.len() == FRAGMENT_COUNT && fragments.iter().all(|f| fragment_ok(f, limits))
}

fn fragment_ok(fragment: &str, limits: &Limits) -> bool {
    let words = word_count(fragment);
    fragment == fragment.trim()
        && !fragment.contains(['<', '>'])
        && !fragment.ends_with('.')
        && (limits.fragment_min_words..=limits.fragment_max_words).contains(&words)
        && !fragment.starts_with(char::is_lowercase)
}

/// Returns `html` unchanged when compliant, otherwise a rebuilt block. The flag is true
/// when a rebuild happened.
pub fn coerce(html: &str, policy: &CategoryPolicy, limits: &Limits) -> (String, bool) {
    let html = html.trim();
    if is_compliant(html, limits) {
        return (html.to_string(), false);
    }
    (build(candidate_fragments(html), policy, limits), true)
}

/// Splits any markup on break markers or a fallback delimiter into plain candidates.
pub fn candidate_fragments(html: &str) -> Vec<String> {
    let marked = FRAGMENT_BOUNDARY.replace_all(html, " • ");
    strip_tags(&marked)
        .split(['•', '|', ';', '·', '\n'])
        .map(str::to_string)
        .collect()
}

/// Builds a compliant block from candidate fragments, padding with the policy's fillers
/// and trimming fragments word by word when over the length ceiling.
pub fn build(candidates: Vec<String>, policy: &CategoryPolicy, limits: &Limits) -> String {
    let mut fragments: Vec<String> = Vec::with_capacity(FRAGMENT_COUNT);
    let tidied = candidates
        .iter()
        .chain(policy.filler_fragments.iter())
        .map(|c| tidy_fragment(c, limits))
        .chain(LAST_RESORT_FRAGMENTS.iter().map(|c| c.to_string()));

    for fragment in tidied {
        if fragments.len() == FRAGMENT_COUNT {
            break;
        }
        if word_count(&fragment) < limits.fragment_min_words {
            continue;
        }
        if fragments.iter().any(|f| f.eq_ignore_ascii_case(&fragment)) {
            continue;
        }
        fragments.push(fragment);
    }

    shrink_to_fit(&mut fragments, limits);
    let html = render(&fragments);
    if char_len(&html) <= limits.short_max_chars {
        return html;
    }

    let fillers: Vec<String> = policy
        .filler_fragments
        .iter()
        .take(FRAGMENT_COUNT)
        .map(|f| tidy_fragment(f, limits))
        .collect();
    let html = render(&fillers);
    if fillers.len() == FRAGMENT_COUNT && is_compliant(&html, limits) {
        html
    } else {
        render(LAST_RESORT_FRAGMENTS)
    }
}

/// Plain text, no terminal punctuation, capped at the word limit, capitalised.
fn tidy_fragment(text: &str, limits: &Limits) -> String {
    let plain = collapse_whitespace(&text.replace(['<', '>'], " "));
    let words: Vec<&str> = plain.split_whitespace().take(limits.fragment_max_words).collect();
    let joined = words.join(" ");
    let trimmed = joined.trim_end_matches(['.', ',', ';', ':', '!', '?', ' ']);
    capitalize_first(trimmed)
}

/// Drops words from the last fragment, then earlier ones, never going below the
/// minimum word count.
fn shrink_to_fit(fragments: &mut [String], limits: &Limits) {
    while char_len(&render(&fragments[..])) > limits.short_max_chars {
        let Some(target) = fragments
            .iter_mut()
            .rev()
            .find(|f| word_count(f) > limits.fragment_min_words)
        else {
            return;
        };
        let mut words: Vec<&str> = target.split_whitespace().collect();
        words.pop();
        let shortened = words.join(" ");
        *target = shortened.trim_end_matches([',', ';', ':', '.']).to_string();
    }
}

fn render<S: AsRef<str>>(fragments: &[S]) -> String {
    let joined: Vec<&str> = fragments.iter().map(|f| f.as_ref()).collect();
    format!("<p>{}</p>", joined.join("<br>"))
}
