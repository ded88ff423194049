//! Output contract enforcement.
//!
//! Every description bundle that leaves the pipeline, generated or fallback, passes
//! through `ContractEnforcer` so the short, meta and long fields always satisfy their
//! hard limits.

pub mod long_form;
pub mod meta;
pub mod short_form;
pub mod spec_lines;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::CategoryPolicy;
use crate::models::{present, DescriptionBundle, ProductFacts};
use crate::rules::{ContentRules, Limits};
use crate::sanitize::{normalize_paragraphs, ParagraphStyle, Sanitizer};
use crate::seo::{self, MetaAdjuster, MetaIssue, MetaReport};

use self::long_form::LongForm;
use self::meta::{filler_sentence, weave_brand, MetaShaper};

/// What the contract did to one field of generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldVerdict {
    /// Already compliant, passed through.
    Accepted,
    /// Rebuilt from the generated content.
    Coerced,
    /// Generated content unusable; replaced from product data.
    Regenerated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub short: FieldVerdict,
    pub meta: FieldVerdict,
    pub long: FieldVerdict,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_issues: Vec<MetaIssue>,
}

impl ValidationOutcome {
    pub fn all_accepted(&self) -> bool {
        [self.short, self.meta, self.long]
            .iter()
            .all(|v| *v == FieldVerdict::Accepted)
    }
}

pub struct ContractEnforcer {
    rules: Arc<ContentRules>,
    sanitizer: Sanitizer,
    shaper: MetaShaper,
    seo: MetaAdjuster,
}

impl ContractEnforcer {
    pub fn new(rules: Arc<ContentRules>) -> Self {
        Self {
            sanitizer: Sanitizer::new(&rules),
            shaper: MetaShaper::new(&rules),
            seo: MetaAdjuster::new(Arc::clone(&rules)),
            rules,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.rules.limits
    }

    pub fn shaper(&self) -> &MetaShaper {
        &self.shaper
    }

    pub fn meta_adjuster(&self) -> &MetaAdjuster {
        &self.seo
    }

    /// Validates and coerces generated markup into a compliant bundle.
    pub fn enforce(
        &self,
        short_html: &str,
        long_html: &str,
        product: &ProductFacts,
        policy: &CategoryPolicy,
    ) -> (DescriptionBundle, ValidationOutcome) {
        let short_in = self.sanitizer.sanitize(short_html);
        let long_in = self.sanitizer.sanitize(long_html);

        let (short, short_rebuilt) = short_form::coerce(&short_in, policy, self.limits());
        let (form, meta_verdict) = long_form::coerce(&long_in, product, policy, &self.shaper);
        let meta_before = form.meta.clone();

        let (bundle, report) = self.finish(short, form, product, policy);

        let short = if !short_rebuilt && bundle.short_description == short_in.trim() {
            FieldVerdict::Accepted
        } else {
            FieldVerdict::Coerced
        };
        let meta = match meta_verdict {
            FieldVerdict::Regenerated => FieldVerdict::Regenerated,
            verdict if bundle.meta_description == meta_before => verdict,
            _ => FieldVerdict::Coerced,
        };
        let long = if bundle.long_description == normalize_paragraphs(&long_in, ParagraphStyle::Paragraphs) {
            FieldVerdict::Accepted
        } else {
            FieldVerdict::Coerced
        };

        let outcome = ValidationOutcome {
            short,
            meta,
            long,
            meta_issues: report.issues,
        };
        debug!(
            "Contract for '{}': short={:?} meta={:?} long={:?}",
            product.name, outcome.short, outcome.meta, outcome.long
        );
        (bundle, outcome)
    }

    /// Shared tail of the generated and fallback paths: sanitize, name the brand once in
    /// the meta, fix the meta for SEO, and render under the long budget.
    pub fn finish(
        &self,
        short_html: String,
        form: LongForm,
        product: &ProductFacts,
        policy: &CategoryPolicy,
    ) -> (DescriptionBundle, MetaReport) {
        let limits = self.limits();

        let mut short = self.sanitizer.sanitize(&short_html);
        if !short_form::is_compliant(&short, limits) {
            short = self.sanitizer.sanitize(&short_form::coerce(&short, policy, limits).0);
        }
        if !short_form::is_compliant(&short, limits) {
            short = short_form::build(Vec::new(), policy, limits);
        }

        let mut form = form.map_text(|p| self.sanitizer.sanitize(p));
        if form.meta.trim().is_empty() {
            form.meta = self.shaper.fit_window(&filler_sentence(&product.name));
        }
        if let Some(brand) = present(&product.brand).filter(|b| !self.sanitizer.would_alter(b)) {
            form.meta = weave_brand(&form.meta, brand, &product.name);
        }

        let keywords = seo::extract_keywords(product, policy, &self.rules, &self.sanitizer);
        let report = self.seo.validate_and_fix(&form.meta, &product.name, &keywords);
        form.meta = report.fixed.clone();

        let bundle = DescriptionBundle {
            short_description: short,
            meta_description: report.fixed.clone(),
            long_description: form.render(limits.long_max_chars),
        };
        (bundle, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, PolicyRegistry};
    use crate::contract::meta::capitalize_first;
    use crate::sanitize::split_paragraphs;
    use proptest::prelude::*;
    use serde_json::json;

    const META: &str = "A generously sized stoneware casserole that moves from oven to table with ease, keeping family meals warm while adding a relaxed, rustic look to dinners.";

    fn enforcer() -> ContractEnforcer {
        ContractEnforcer::new(Arc::new(ContentRules::default()))
    }

    fn casserole() -> ProductFacts {
        let mut product = ProductFacts::named("Stoneware Casserole");
        product
            .specifications
            .insert("capacity".into(), json!("3.5 litres"));
        product
    }

    #[test]
    fn test_compliant_copy_is_accepted_everywhere() {
        let registry = PolicyRegistry::builtin();
        let short = "<p>Glazed stoneware casserole<br>Oven to table<br>Generous family size</p>";
        let long = format!(
            "<p>{META}</p>\
             <p>Bring it straight from the oven to the middle of the table for relaxed family suppers.</p>\
             <p>Capacity: 3.5 litres.</p>"
        );

        let (bundle, outcome) = enforcer().enforce(
            short,
            &long,
            &casserole(),
            registry.policy(Category::DiningDrinkLiving),
        );
        assert_eq!(bundle.short_description, short);
        assert_eq!(bundle.meta_description, META);
        assert_eq!(bundle.long_description, long);
        assert!(outcome.all_accepted(), "{outcome:?}");
    }

    #[test]
    fn test_forbidden_phrases_never_survive() {
        let registry = PolicyRegistry::builtin();
        let short = "<p>Since 1919 heritage<br>Oven to table<br>Generous family size</p>";
        let long = "<p>Harts of Stur presents a roomy stoneware casserole for relaxed family dinners.</p>\
                    <p>Made by a family-run pottery in Dorset with care and attention.</p>";

        let (bundle, outcome) = enforcer().enforce(
            short,
            long,
            &casserole(),
            registry.policy(Category::DiningDrinkLiving),
        );
        for field in [&bundle.short_description, &bundle.meta_description, &bundle.long_description] {
            let lower = field.to_lowercase();
            assert!(!lower.contains("since 1919"), "{field}");
            assert!(!lower.contains("harts of stur"), "{field}");
            assert!(!lower.contains("dorset"), "{field}");
            assert!(!lower.contains("family-run"), "{field}");
        }
        assert_eq!(outcome.short, FieldVerdict::Coerced);
        assert!(short_form::is_compliant(&bundle.short_description, &Limits::default()));
    }

    #[test]
    fn test_meta_is_first_paragraph_and_in_window() {
        let registry = PolicyRegistry::builtin();
        let (bundle, _) = enforcer().enforce(
            "",
            "<p>Sturdy.</p><p>Shop now for great prices on this pan that heats evenly and cleans easily.</p>",
            &ProductFacts::named("Pro Frying Pan"),
            registry.policy(Category::BakewareCookware),
        );

        let paragraphs = split_paragraphs(&bundle.long_description);
        assert_eq!(paragraphs[0], bundle.meta_description);
        let len = bundle.meta_description.chars().count();
        assert!((150..=160).contains(&len), "{}", bundle.meta_description);
        assert!(bundle.long_description.chars().count() <= 2000);
    }

    #[test]
    fn test_brand_woven_into_meta_once() {
        let registry = PolicyRegistry::builtin();
        let mut product = casserole();
        product.brand = Some("Denby".into());
        let long = format!(
            "<p>{META}</p><p>Bring it straight from the oven to the middle of the table.</p>"
        );

        let (bundle, outcome) = enforcer().enforce(
            "",
            &long,
            &product,
            registry.policy(Category::DiningDrinkLiving),
        );
        let meta = &bundle.meta_description;
        assert_eq!(meta.matches("Denby").count(), 1, "{meta}");
        assert!((150..=160).contains(&meta.chars().count()), "{meta} ({})", meta.chars().count());
        assert!(meta.ends_with('.') && !meta.ends_with(".."));
        assert_eq!(split_paragraphs(&bundle.long_description)[0], *meta);
        assert_eq!(outcome.meta, FieldVerdict::Coerced);

        // already branded copy keeps its single mention
        let branded = enforcer().enforce(
            "",
            &format!("<p>{}</p>", bundle.meta_description),
            &product,
            registry.policy(Category::DiningDrinkLiving),
        );
        assert_eq!(branded.0.meta_description.matches("Denby").count(), 1);
    }

    #[test]
    fn test_forbidden_brand_is_not_woven() {
        let registry = PolicyRegistry::builtin();
        let mut product = casserole();
        product.brand = Some("Harts of Stur".into());

        let (bundle, _) = enforcer().enforce(
            "",
            &format!("<p>{META}</p>"),
            &product,
            registry.policy(Category::DiningDrinkLiving),
        );
        assert!(!bundle.meta_description.to_lowercase().contains("harts of stur"));
        assert_eq!(bundle.meta_description, META);
    }

    #[test]
    fn test_outcome_serializes_snake_case_verdicts() {
        let outcome = ValidationOutcome {
            short: FieldVerdict::Accepted,
            meta: FieldVerdict::Regenerated,
            long: FieldVerdict::Coerced,
            meta_issues: vec![MetaIssue::MetaTooShort],
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["meta"], "regenerated");
        assert_eq!(value["metaIssues"][0], "meta_too_short");
    }

    fn markup_piece() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("<p>".to_string()),
            Just("</p>".to_string()),
            Just("<br>".to_string()),
            Just("<li>".to_string()),
            Just("<strong>".to_string()),
            Just("</strong>".to_string()),
            Just("\n".to_string()),
            Just(" ".to_string()),
            Just(". ".to_string()),
            Just(", ".to_string()),
            Just("Since 1919".to_string()),
            Just("Harts of Stur".to_string()),
            Just("family-run".to_string()),
            Just("Shop now".to_string()),
            Just("great prices".to_string()),
            Just("Capacity: 2 litres.".to_string()),
            Just("Made in UK.".to_string()),
            Just("crème brûlée".to_string()),
            "[a-zA-Z]{1,12}",
        ]
    }

    fn markup() -> impl Strategy<Value = String> {
        let sentence = prop::collection::vec("[a-z]{2,10}", 3..40)
            .prop_map(|words| format!("<p>{}.</p>", capitalize_first(&words.join(" "))));
        prop::collection::vec(prop_oneof![3 => markup_piece(), 1 => sentence], 0..50)
            .prop_map(|parts| parts.concat())
    }

    fn brands() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("Denby".to_string())),
            Just(Some("Netherton Foundry".to_string())),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_enforced_bundle_meets_contract(
            short in markup(),
            long in markup(),
            name in "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10}){0,3}",
            brand in brands(),
            index in 0..Category::ALL.len(),
        ) {
            let registry = PolicyRegistry::builtin();
            let limits = Limits::default();
            let mut product = ProductFacts::named(&name);
            product.brand = brand;

            let (bundle, _) = enforcer().enforce(&short, &long, &product, registry.policy(Category::ALL[index]));

            prop_assert!(short_form::is_compliant(&bundle.short_description, &limits), "{}", bundle.short_description);

            let meta = &bundle.meta_description;
            let len = meta.chars().count();
            prop_assert!((150..=160).contains(&len), "{} ({})", meta, len);
            prop_assert!(meta.ends_with('.') && !meta.ends_with(".."), "{}", meta);

            let paragraphs = split_paragraphs(&bundle.long_description);
            prop_assert_eq!(paragraphs.first(), Some(meta));
            prop_assert!(bundle.long_description.chars().count() <= 2000);

            for field in [&bundle.short_description, meta, &bundle.long_description] {
                let lower = field.to_lowercase();
                prop_assert!(!lower.contains("since 1919"), "{}", field);
                prop_assert!(!lower.contains("harts of stur"), "{}", field);
                prop_assert!(!lower.contains("family-run"), "{}", field);
            }
        }
    }
}
