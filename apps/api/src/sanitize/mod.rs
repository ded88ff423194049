//! Sanitizer: strips forbidden brand/provenance phrases and dangerous markup from
//! generated copy, and converts between the two paragraph markup styles.
//!
//! `Sanitizer::sanitize` runs its pass to a fixed point. Every rewrite in a pass removes
//! bytes, so the loop terminates and the result is stable under re-sanitising.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::rules::ContentRules;

// ────────────────────────────────────────────────────────────────────────────
// Patterns
// ────────────────────────────────────────────────────────────────────────────

/// Block elements removed together with their content.
static DANGEROUS_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "iframe", "object"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</\s*{tag}\s*>")).unwrap()
        })
        .collect()
});

/// Void or unterminated dangerous tags.
static DANGEROUS_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?\s*(?:script|style|iframe|object|embed|meta|link)\b[^>]*>").unwrap()
});

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[a-zA-Z][^<>]*>").unwrap());

static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});

static JS_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").unwrap());

static IMPORTED_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bimported\s+from\s+\w+\b").unwrap());

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,;:!?])").unwrap());
static CLAUSE_THEN_PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;:]\s*\.").unwrap());
static REPEATED_PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(?:\s*\.)+").unwrap());
static REPEATED_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(?:\s*,)+").unwrap());
static LEADING_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[.,;:]+\s*").unwrap());
static PUNCT_AFTER_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<p(?:\s[^>]*)?>|<br\s*/?>)\s*[.,;:]+\s*").unwrap()
});
static SPACE_AFTER_OPEN_P: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(<p(?:\s[^>]*)?>)\s+").unwrap());
static SPACE_BEFORE_CLOSE_P: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(</p\s*>)").unwrap());
static EMPTY_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>\s*</p\s*>").unwrap());

static BREAK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){2,}").unwrap());
static PARAGRAPH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?p(?:\s[^>]*)?>").unwrap());
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static INNER_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*<br\s*/?>\s*").unwrap());
static EDGE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:<br>)+|(?:<br>)+$").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]+>").unwrap());
static BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Sanitizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Sanitizer {
    phrases: Vec<Regex>,
}

impl Sanitizer {
    pub fn new(rules: &ContentRules) -> Self {
        let phrases = rules
            .forbidden_phrases
            .iter()
            .filter_map(|phrase| phrase_pattern(phrase))
            .collect();
        Self { phrases }
    }

    pub fn sanitize(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// True when `text` carries something the sanitizer would remove.
    pub fn would_alter(&self, text: &str) -> bool {
        self.sanitize(text) != text.trim()
    }

    fn pass(&self, text: &str) -> String {
        let mut out = strip_dangerous_markup(text);

        out = out.replace("&nbsp;", " ").replace('\u{a0}', " ");
        out = IMPORTED_FROM.replace_all(&out, "").into_owned();
        for pattern in &self.phrases {
            let before = out.len();
            out = pattern.replace_all(&out, "").into_owned();
            if out.len() != before {
                debug!("Removed forbidden phrase matching /{}/", pattern.as_str());
            }
        }

        clean_debris(&out)
    }
}

/// Builds a case-insensitive pattern for `phrase` that tolerates whitespace,
/// `&nbsp;` or inline tags between its words.
fn phrase_pattern(phrase: &str) -> Option<Regex> {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    let body = words.join(r"(?:\s|&nbsp;|<[^<>]+>)+");
    Regex::new(&format!(r"(?i)\b{body}\b")).ok()
}

fn strip_dangerous_markup(text: &str) -> String {
    let mut out = text.to_string();
    for block in DANGEROUS_BLOCKS.iter() {
        out = block.replace_all(&out, "").into_owned();
    }
    out = DANGEROUS_TAGS.replace_all(&out, "").into_owned();
    out = OPEN_TAG
        .replace_all(&out, |caps: &Captures| {
            EVENT_HANDLER.replace_all(&caps[0], "").into_owned()
        })
        .into_owned();
    JS_URL.replace_all(&out, "").into_owned()
}

/// Collapses whitespace and the punctuation left behind by removals.
fn clean_debris(text: &str) -> String {
    let mut out = MULTI_SPACE.replace_all(text, " ").into_owned();
    out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
    out = CLAUSE_THEN_PERIOD.replace_all(&out, ".").into_owned();
    out = REPEATED_PERIOD.replace_all(&out, ".").into_owned();
    out = REPEATED_COMMA.replace_all(&out, ",").into_owned();
    out = LEADING_PUNCT.replace(&out, "").into_owned();
    out = PUNCT_AFTER_BREAK.replace_all(&out, "$1").into_owned();
    out = SPACE_AFTER_OPEN_P.replace_all(&out, "$1").into_owned();
    out = SPACE_BEFORE_CLOSE_P.replace_all(&out, "$1").into_owned();
    out = EMPTY_PARAGRAPH.replace_all(&out, "").into_owned();
    out.trim().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Markup helpers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    /// `<p>one</p><p>two</p>`
    Paragraphs,
    /// `one<br><br>two`
    LineBreaks,
}

/// Splits markup in either style into paragraph bodies.
///
/// A paragraph boundary is two or more consecutive `<br>`s, any `<p>`/`</p>` tag, or a
/// blank line. Single `<br>`s inside a paragraph are kept as `<br>`.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    let marked = BREAK_RUN.replace_all(content, "\n\n");
    let marked = PARAGRAPH_TAG.replace_all(&marked, "\n\n");

    BLANK_LINE
        .split(&marked)
        .map(|chunk| {
            let collapsed = WHITESPACE.replace_all(chunk, " ");
            let breaks = INNER_BREAK.replace_all(collapsed.trim(), "<br>");
            EDGE_BREAKS.replace_all(&breaks, "").trim().to_string()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn render_paragraphs<S: AsRef<str>>(paragraphs: &[S], style: ParagraphStyle) -> String {
    match style {
        ParagraphStyle::Paragraphs => paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", p.as_ref()))
            .collect(),
        ParagraphStyle::LineBreaks => paragraphs
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join("<br><br>"),
    }
}

/// Re-renders `content` in `style` without losing paragraph boundaries.
pub fn normalize_paragraphs(content: &str, style: ParagraphStyle) -> String {
    render_paragraphs(&split_paragraphs(content), style)
}

/// Plain text of `content`: tags removed (`<br>` becomes a space), common entities decoded,
/// whitespace collapsed.
pub fn strip_tags(content: &str) -> String {
    let spaced = BREAK_TAG.replace_all(content, " ");
    let bare = ANY_TAG.replace_all(&spaced, "");
    let decoded = bare
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(&ContentRules::default())
    }

    #[test]
    fn test_removes_phrase_split_by_inline_tag() {
        let out = sanitizer().sanitize("<p>Trusted quality Since<br>1919, made for cooks.</p>");
        assert_eq!(out, "<p>Trusted quality, made for cooks.</p>");
    }

    #[test]
    fn test_removes_phrase_at_paragraph_start_without_orphans() {
        let out = sanitizer().sanitize("<p>Since 1919. A pan for every hob.</p>");
        assert_eq!(out, "<p>A pan for every hob.</p>");
    }

    #[test]
    fn test_phrase_matching_is_case_insensitive_and_nbsp_tolerant() {
        let out = sanitizer().sanitize("Sold by HARTS&nbsp;OF stur today.");
        assert_eq!(out, "Sold by today.");
    }

    #[test]
    fn test_removes_imported_from_country() {
        let out = sanitizer().sanitize("Elegant stoneware imported from Portugal.");
        assert_eq!(out, "Elegant stoneware.");
    }

    #[test]
    fn test_removes_family_run_variants() {
        let s = sanitizer();
        assert_eq!(s.sanitize("A family-run favourite."), "A favourite.");
        assert_eq!(s.sanitize("A family run favourite."), "A favourite.");
    }

    #[test]
    fn test_strips_script_blocks_and_dangerous_tags() {
        let out = sanitizer().sanitize(
            "<p>Safe</p><script>alert('x')</script><style>p{}</style><iframe src=x></iframe><meta charset=utf-8><link rel=x>",
        );
        assert_eq!(out, "<p>Safe</p>");
    }

    #[test]
    fn test_strips_event_handlers_and_javascript_urls() {
        let out = sanitizer()
            .sanitize(r#"<p onclick="steal()">Hi <a href="javascript:alert(1)" onmouseover=x>there</a></p>"#);
        assert_eq!(out, r#"<p>Hi <a href="alert(1)">there</a></p>"#);
    }

    #[test]
    fn test_event_handler_words_in_prose_survive() {
        let out = sanitizer().sanitize("<p>Ideal for one person = small kitchens</p>");
        assert_eq!(out, "<p>Ideal for one person = small kitchens</p>");
    }

    #[test]
    fn test_drops_paragraph_emptied_by_removal() {
        let out = sanitizer().sanitize("<p>Dorset</p><p>Sturdy handles.</p>");
        assert_eq!(out, "<p>Sturdy handles.</p>");
    }

    #[test]
    fn test_clean_text_is_unchanged() {
        let clean = "<p>A sturdy 24cm pan.</p><p>Weight: 1.2kg.</p>";
        assert_eq!(sanitizer().sanitize(clean), clean);
        assert!(!sanitizer().would_alter(clean));
    }

    #[test]
    fn test_split_handles_both_styles() {
        assert_eq!(split_paragraphs("<p>One</p><p>Two</p>"), vec!["One", "Two"]);
        assert_eq!(split_paragraphs("One<br><br>Two"), vec!["One", "Two"]);
        assert_eq!(split_paragraphs("One<br/>\n<BR>Two"), vec!["One", "Two"]);
        assert_eq!(split_paragraphs("<p>Line<br>break</p>"), vec!["Line<br>break"]);
    }

    #[test]
    fn test_normalize_converts_between_styles() {
        let html = "<p>First para.</p>\n<p>Second<br>line.</p>";
        let breaks = normalize_paragraphs(html, ParagraphStyle::LineBreaks);
        assert_eq!(breaks, "First para.<br><br>Second<br>line.");
        assert_eq!(
            normalize_paragraphs(&breaks, ParagraphStyle::Paragraphs),
            "<p>First para.</p><p>Second<br>line.</p>"
        );
    }

    #[test]
    fn test_strip_tags_spaces_breaks_and_decodes_entities() {
        assert_eq!(strip_tags("<p>Salt &amp; pepper<br>mill</p>"), "Salt & pepper mill");
    }

    fn markup_piece() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("<p>".to_string()),
            Just("</p>".to_string()),
            Just("<br>".to_string()),
            Just("<br/>".to_string()),
            Just("\n".to_string()),
            Just(" ".to_string()),
            Just(".".to_string()),
            Just(",".to_string()),
            Just("Since 1919".to_string()),
            Just("Dorset".to_string()),
            Just("<script>x</script>".to_string()),
            "[a-zA-Z]{1,8}",
        ]
    }

    fn markup() -> impl Strategy<Value = String> {
        prop::collection::vec(markup_piece(), 0..30).prop_map(|parts| parts.concat())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_sanitize_is_idempotent(input in markup()) {
            let s = sanitizer();
            let once = s.sanitize(&input);
            prop_assert_eq!(s.sanitize(&once), once);
        }

        #[test]
        fn prop_sanitize_removes_forbidden_phrases(input in markup()) {
            let s = sanitizer();
            let out = s.sanitize(&input);
            prop_assert!(!s.phrases.iter().any(|p| p.is_match(&out)), "{}", out);
            prop_assert!(!out.to_lowercase().contains("<script"));
        }

        #[test]
        fn prop_normalize_is_idempotent(input in markup()) {
            for style in [ParagraphStyle::Paragraphs, ParagraphStyle::LineBreaks] {
                let once = normalize_paragraphs(&input, style);
                prop_assert_eq!(normalize_paragraphs(&once, style), once);
            }
        }

        #[test]
        fn prop_style_round_trip_keeps_paragraphs(input in markup()) {
            let paragraphs = split_paragraphs(&input);
            let breaks = normalize_paragraphs(&input, ParagraphStyle::LineBreaks);
            prop_assert_eq!(split_paragraphs(&breaks), paragraphs);
        }
    }
}
