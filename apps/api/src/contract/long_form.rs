//! Long description contract.
//!
//! Paragraph order is fixed: meta sentence, lifestyle prose, one technical paragraph,
//! then spec/closer lines. The whole block stays under the long budget; prose is
//! shortened before spec lines and the meta paragraph is never touched.

use crate::catalog::CategoryPolicy;
use crate::contract::meta::{
    char_len, filler_sentence, finish_sentence, finish_terminal, first_sentence, take_chars,
    trim_dangling, word_count, MetaShaper,
};
use crate::contract::spec_lines::{build_spec_lines, is_spec_line};
use crate::contract::FieldVerdict;
use crate::models::ProductFacts;
use crate::sanitize::{render_paragraphs, split_paragraphs, strip_tags, ParagraphStyle};

/// Meta candidates shorter than this are replaced by the filler sentence.
const MIN_META_WORDS: usize = 4;
/// Paragraphs at or under this many words are closers rather than prose.
const CLOSER_MAX_WORDS: usize = 6;
/// A shortened prose paragraph with fewer words is dropped instead.
const MIN_PROSE_WORDS: usize = 4;
/// `<p>` + `</p>`
const PARAGRAPH_MARKUP: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongForm {
    pub meta: String,
    pub lifestyle: Vec<String>,
    pub technical: Option<String>,
    pub spec_lines: Vec<String>,
}

impl LongForm {
    pub fn paragraphs(&self) -> Vec<&str> {
        std::iter::once(self.meta.as_str())
            .chain(self.lifestyle.iter().map(String::as_str))
            .chain(self.technical.as_deref())
            .chain(self.spec_lines.iter().map(String::as_str))
            .collect()
    }

    /// Applies `f` to every paragraph, dropping any that come back empty.
    /// The meta paragraph is kept even when empty so callers can regenerate it.
    pub fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        let keep = |p: String| Some(p).filter(|p| !p.trim().is_empty());
        Self {
            meta: f(&self.meta),
            lifestyle: self.lifestyle.iter().filter_map(|p| keep(f(p))).collect(),
            technical: self.technical.as_deref().and_then(|p| keep(f(p))),
            spec_lines: self.spec_lines.iter().filter_map(|p| keep(f(p))).collect(),
        }
    }

    /// `<p>`-wrapped markup no longer than `max_chars`.
    pub fn render(&self, max_chars: usize) -> String {
        let mut form = self.clone();
        form.shrink_to(max_chars);
        render_paragraphs(&form.paragraphs(), ParagraphStyle::Paragraphs)
    }

    fn rendered_len(&self) -> usize {
        self.paragraphs()
            .iter()
            .map(|p| char_len(p) + PARAGRAPH_MARKUP)
            .sum()
    }

    fn shrink_to(&mut self, max_chars: usize) {
        while self.rendered_len() > max_chars {
            let overflow = self.rendered_len() - max_chars;

            if let Some(last) = self.lifestyle.last_mut() {
                if !shorten(last, overflow) {
                    self.lifestyle.pop();
                }
                continue;
            }
            if let Some(technical) = self.technical.as_mut() {
                if !shorten(technical, overflow) {
                    self.technical = None;
                }
                continue;
            }
            if self.spec_lines.pop().is_none() {
                return;
            }
        }
    }
}

/// Opening paragraph used when the generator produced no usable prose.
pub fn generic_lifestyle(product_name: &str) -> String {
    format!(
        "{} is designed for everyday use with clear, accurate details to help you choose with confidence.",
        product_name.trim()
    )
}

/// Rebuilds generated long markup into a `LongForm`. The verdict describes the meta
/// paragraph.
pub fn coerce(
    html: &str,
    product: &ProductFacts,
    policy: &CategoryPolicy,
    shaper: &MetaShaper,
) -> (LongForm, FieldVerdict) {
    let mut paragraphs = split_paragraphs(html).into_iter();
    let first = paragraphs.next().unwrap_or_default();
    let first_plain = strip_tags(&first);

    let candidate = finish_sentence(&shaper.strip_retail_terms(&first_plain));
    let (meta, verdict) = if word_count(&candidate) < MIN_META_WORDS || is_spec_line(&first_plain) {
        (shaper.fit_window(&filler_sentence(&product.name)), FieldVerdict::Regenerated)
    } else {
        let fitted = shaper.fit_window(&candidate);
        let verdict = if fitted == first {
            FieldVerdict::Accepted
        } else {
            FieldVerdict::Coerced
        };
        (fitted, verdict)
    };

    let mut prose = Vec::new();
    let mut closers = Vec::new();
    for paragraph in paragraphs {
        let plain = strip_tags(&paragraph);
        if is_spec_line(&plain) {
            continue;
        }
        if word_count(&plain) <= CLOSER_MAX_WORDS {
            closers.push(paragraph);
        } else {
            prose.push(paragraph);
        }
    }

    let (mut lifestyle, technical) = classify_prose(prose, policy);
    if lifestyle.is_empty() && technical.is_none() {
        lifestyle.push(generic_lifestyle(&product.name));
    }

    let mut spec_lines = build_spec_lines(product, policy);
    if product.care_text().is_none() {
        spec_lines.extend(closers.into_iter().take(1));
    }

    let form = LongForm {
        meta,
        lifestyle,
        technical,
        spec_lines,
    };
    (form, verdict)
}

/// The last prose paragraph is technical when there are two or more. A lone paragraph
/// is technical only for categories with no lifestyle weight.
fn classify_prose(mut prose: Vec<String>, policy: &CategoryPolicy) -> (Vec<String>, Option<String>) {
    match prose.len() {
        0 => (Vec::new(), None),
        1 if policy.lifestyle_weight == 0 => (Vec::new(), prose.pop()),
        1 => (prose, None),
        _ => {
            let technical = prose.pop();
            (prose, technical)
        }
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let sentence = first_sentence(rest);
        sentences.push(sentence.trim());
        rest = rest[sentence.len()..].trim_start();
    }
    sentences
}

/// Removes at least `overflow` characters, dropping trailing sentences first and
/// cutting at a word boundary when one sentence is left. Returns false when too little
/// would remain to keep the paragraph.
fn shorten(paragraph: &mut String, overflow: usize) -> bool {
    if paragraph.contains('<') {
        *paragraph = strip_tags(paragraph);
    }
    let current = char_len(paragraph);
    if overflow >= current {
        return false;
    }
    let target = current - overflow;

    let mut kept = String::new();
    for sentence in split_sentences(paragraph) {
        let candidate = if kept.is_empty() {
            sentence.to_string()
        } else {
            format!("{kept} {sentence}")
        };
        if char_len(&candidate) > target {
            break;
        }
        kept = candidate;
    }
    if word_count(&kept) >= MIN_PROSE_WORDS {
        *paragraph = kept;
        return true;
    }

    let prefix = take_chars(paragraph, target.saturating_sub(1));
    let at_word = prefix.rfind(char::is_whitespace).map_or(prefix, |idx| &prefix[..idx]);
    let body = trim_dangling(at_word);
    if word_count(&body) < MIN_PROSE_WORDS {
        return false;
    }
    *paragraph = finish_terminal(&body);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, PolicyRegistry};
    use crate::rules::ContentRules;
    use serde_json::json;

    const IN_WINDOW_META: &str = "A generously sized stoneware casserole that moves from oven to table with ease, keeping family meals warm while adding a relaxed, rustic look to dinners.";

    fn shaper() -> MetaShaper {
        MetaShaper::new(&ContentRules::default())
    }

    #[test]
    fn test_spec_line_first_paragraph_regenerates_meta() {
        let registry = PolicyRegistry::builtin();
        let product = ProductFacts::named("Compact Blender");
        let html = "<p>Capacity: 1.5L.</p><p>Blend smoothies, soups and sauces with a powerful motor and simple controls.</p>";

        let (form, verdict) = coerce(html, &product, registry.policy(Category::Electricals), &shaper());
        assert_eq!(verdict, FieldVerdict::Regenerated);
        assert!(form.meta.starts_with("The Compact Blender provides reliable performance"));
        assert!(shaper().in_window(&form.meta));
        // lone prose paragraph is technical for a zero-lifestyle category
        assert!(form.lifestyle.is_empty());
        assert!(form.technical.as_deref().unwrap().starts_with("Blend smoothies"));
    }

    #[test]
    fn test_compliant_meta_is_accepted_and_spec_lines_rebuilt() {
        let registry = PolicyRegistry::builtin();
        let mut product = ProductFacts::named("Stoneware Casserole");
        product
            .specifications
            .insert("capacity".into(), json!("3.5 litres"));
        let html = format!(
            "<p>{IN_WINDOW_META}</p>\
             <p>Bring it straight from the oven to the middle of the table for relaxed family suppers.</p>\
             <p>Glazed stoneware holds heat evenly and is safe in the oven, microwave and freezer.</p>\
             <p>Capacity: 4 litres.</p>"
        );

        let (form, verdict) = coerce(&html, &product, registry.policy(Category::DiningDrinkLiving), &shaper());
        assert_eq!(verdict, FieldVerdict::Accepted);
        assert_eq!(form.meta, IN_WINDOW_META);
        assert_eq!(form.lifestyle.len(), 1);
        assert!(form.technical.as_deref().unwrap().starts_with("Glazed stoneware"));
        assert_eq!(form.spec_lines, vec!["Capacity: 3.5 litres."]);
    }

    #[test]
    fn test_meta_keeps_first_sentence_without_retail_terms() {
        let registry = PolicyRegistry::builtin();
        let product = ProductFacts::named("Roasting Tin");
        let html = "<p>Buy this sturdy roasting tin for generous Sunday roasts. It is great.</p>";

        let (form, verdict) = coerce(html, &product, registry.policy(Category::BakewareCookware), &shaper());
        assert_eq!(verdict, FieldVerdict::Coerced);
        assert!(form.meta.starts_with("This sturdy roasting tin for generous Sunday roasts"));
        assert!(!form.meta.contains("great"));
        assert!(shaper().in_window(&form.meta));
    }

    #[test]
    fn test_empty_markup_gets_generic_lifestyle() {
        let registry = PolicyRegistry::builtin();
        let product = ProductFacts::named("Bread Knife");
        let (form, verdict) = coerce("", &product, registry.policy(Category::KnivesCutlery), &shaper());
        assert_eq!(verdict, FieldVerdict::Regenerated);
        assert_eq!(form.lifestyle, vec![generic_lifestyle("Bread Knife")]);
    }

    #[test]
    fn test_render_shortens_lifestyle_before_anything_else() {
        let sentence = "This sentence describes how the dish feels to use at home every day.";
        let long_prose = vec![sentence; 14].join(" ");
        let form = LongForm {
            meta: IN_WINDOW_META.to_string(),
            lifestyle: vec![long_prose.clone(), long_prose],
            technical: Some("Glazed stoneware holds heat evenly and is oven safe.".to_string()),
            spec_lines: vec!["Capacity: 3.5 litres.".to_string(), "Made in UK.".to_string()],
        };

        let html = form.render(2000);
        assert!(char_len(&html) <= 2000, "{}", char_len(&html));
        assert!(html.starts_with(&format!("<p>{IN_WINDOW_META}</p>")));
        assert!(html.contains("Glazed stoneware holds heat evenly"));
        assert!(html.ends_with("<p>Capacity: 3.5 litres.</p><p>Made in UK.</p>"));
    }

    #[test]
    fn test_render_within_budget_is_unchanged() {
        let form = LongForm {
            meta: IN_WINDOW_META.to_string(),
            lifestyle: vec!["Warm and welcoming at the table.".to_string()],
            technical: None,
            spec_lines: vec![],
        };
        assert_eq!(
            form.render(2000),
            format!("<p>{IN_WINDOW_META}</p><p>Warm and welcoming at the table.</p>")
        );
    }
}
