//! Category policy registry: category → {tone ratio, allowed spec keys, bullet hints}.
//!
//! Built once from `ContentRules` (built-in table unless overridden) and read-only afterwards.
//! Lookups never fail: anything unrecognised resolves to the `General` policy.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize, Serializer};

// ────────────────────────────────────────────────────────────────────────────
// Categories
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Bakeware, Cookware")]
    BakewareCookware,
    #[serde(rename = "Dining, Drink, Living")]
    DiningDrinkLiving,
    #[serde(rename = "Electricals")]
    Electricals,
    #[serde(rename = "Food Prep & Tools")]
    FoodPrepTools,
    #[serde(rename = "Knives, Cutlery")]
    KnivesCutlery,
    #[serde(rename = "Clothing")]
    Clothing,
    #[serde(rename = "Seasonal")]
    Seasonal,
    #[serde(rename = "General")]
    General,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::BakewareCookware,
        Category::DiningDrinkLiving,
        Category::Electricals,
        Category::FoodPrepTools,
        Category::KnivesCutlery,
        Category::Clothing,
        Category::Seasonal,
        Category::General,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::BakewareCookware => "Bakeware, Cookware",
            Category::DiningDrinkLiving => "Dining, Drink, Living",
            Category::Electricals => "Electricals",
            Category::FoodPrepTools => "Food Prep & Tools",
            Category::KnivesCutlery => "Knives, Cutlery",
            Category::Clothing => "Clothing",
            Category::Seasonal => "Seasonal",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive substring synonyms, checked in order after exact names.
const SYNONYMS: &[(&str, Category)] = &[
    ("bakeware", Category::BakewareCookware),
    ("cookware", Category::BakewareCookware),
    ("dining", Category::DiningDrinkLiving),
    ("drink", Category::DiningDrinkLiving),
    ("living", Category::DiningDrinkLiving),
    ("electrical", Category::Electricals),
    ("food prep", Category::FoodPrepTools),
    ("tools", Category::FoodPrepTools),
    ("knives", Category::KnivesCutlery),
    ("cutlery", Category::KnivesCutlery),
    ("clothes", Category::Clothing),
    ("clothing", Category::Clothing),
    ("seasonal", Category::Seasonal),
    ("christmas", Category::Seasonal),
];

// ────────────────────────────────────────────────────────────────────────────
// Policies
// ────────────────────────────────────────────────────────────────────────────

/// Serializable policy definition, as it appears in a content rules file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySpec {
    pub category: Category,
    pub lifestyle_weight: u8,
    pub technical_weight: u8,
    pub bullet_hints: Vec<String>,
    pub allowed_spec_keys: Vec<String>,
    /// Generic short-block fragments used when real ones run out.
    pub filler_fragments: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPolicy {
    pub category: Category,
    pub lifestyle_weight: u8,
    pub technical_weight: u8,
    pub bullet_hints: Vec<String>,
    #[serde(serialize_with = "sorted_keys")]
    pub allowed_spec_keys: HashSet<String>,
    pub filler_fragments: Vec<String>,
}

impl CategoryPolicy {
    pub fn allows(&self, key: &str) -> bool {
        self.allowed_spec_keys.contains(key)
    }

    /// One-line summary used in prompts, e.g. `Electricals | Lifestyle 0 : Technical 100 | ...`.
    pub fn matrix_line(&self) -> String {
        format!(
            "{} | Lifestyle {} : Technical {} | Short bullets: {}",
            self.category,
            self.lifestyle_weight,
            self.technical_weight,
            self.bullet_hints.join("; ")
        )
    }
}

fn sorted_keys<S: Serializer>(keys: &HashSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
    let sorted: BTreeSet<&String> = keys.iter().collect();
    serializer.collect_seq(sorted)
}

impl TryFrom<PolicySpec> for CategoryPolicy {
    type Error = anyhow::Error;

    fn try_from(spec: PolicySpec) -> Result<Self> {
        if u16::from(spec.lifestyle_weight) + u16::from(spec.technical_weight) != 100 {
            bail!(
                "{}: lifestyle ({}) and technical ({}) weights must sum to 100",
                spec.category,
                spec.lifestyle_weight,
                spec.technical_weight
            );
        }
        if spec.filler_fragments.len() < 3 {
            bail!("{}: at least three filler fragments are required", spec.category);
        }
        Ok(assemble(spec))
    }
}

fn assemble(spec: PolicySpec) -> CategoryPolicy {
    CategoryPolicy {
        category: spec.category,
        lifestyle_weight: spec.lifestyle_weight,
        technical_weight: spec.technical_weight,
        bullet_hints: spec.bullet_hints,
        allowed_spec_keys: spec.allowed_spec_keys.into_iter().collect(),
        filler_fragments: spec.filler_fragments,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<Category, CategoryPolicy>,
}

impl PolicyRegistry {
    /// Builds the registry from explicit specs. Categories missing from `specs`
    /// (including `General`) keep their built-in policy.
    pub fn from_specs(specs: Vec<PolicySpec>) -> Result<Self> {
        let mut policies: HashMap<Category, CategoryPolicy> = HashMap::new();
        for spec in builtin_specs().into_iter().chain(specs) {
            let policy = CategoryPolicy::try_from(spec)?;
            policies.insert(policy.category, policy);
        }
        Ok(Self { policies })
    }

    pub fn builtin() -> Self {
        let policies = builtin_specs()
            .into_iter()
            .map(assemble)
            .map(|p| (p.category, p))
            .collect();
        Self { policies }
    }

    /// Maps a free-form category name onto the fixed enumeration.
    pub fn normalise(&self, raw: &str) -> Category {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Category::General;
        }

        if let Some(exact) = Category::ALL
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
        {
            return *exact;
        }

        let lower = trimmed.to_lowercase();
        SYNONYMS
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, category)| *category)
            .unwrap_or(Category::General)
    }

    pub fn policy(&self, category: Category) -> &CategoryPolicy {
        self.policies
            .get(&category)
            .or_else(|| self.policies.get(&Category::General))
            .unwrap_or(&*GENERAL_POLICY)
    }

    pub fn policy_for(&self, raw_category: &str) -> &CategoryPolicy {
        self.policy(self.normalise(raw_category))
    }

    pub fn spec_allowed(&self, category: Category, key: &str) -> bool {
        self.policy(category).allows(key)
    }

    /// Policies in enumeration order.
    pub fn policies(&self) -> Vec<&CategoryPolicy> {
        Category::ALL.iter().map(|c| self.policy(*c)).collect()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static GENERAL_POLICY: LazyLock<CategoryPolicy> = LazyLock::new(|| assemble(general_spec()));

const COMMON_KEYS: &[&str] = &["material", "dimensions", "weight", "capacity", "origin", "guarantee", "care"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn spec(
    category: Category,
    lifestyle: u8,
    hints: &[&str],
    keys: &[&str],
    fillers: &[&str],
) -> PolicySpec {
    PolicySpec {
        category,
        lifestyle_weight: lifestyle,
        technical_weight: 100 - lifestyle,
        bullet_hints: strings(hints),
        allowed_spec_keys: strings(keys),
        filler_fragments: strings(fillers),
    }
}

fn general_spec() -> PolicySpec {
    spec(
        Category::General,
        50,
        &["what it is", "who it's for", "core benefit"],
        COMMON_KEYS,
        &["Designed for everyday use", "Practical home essential", "Simple to use"],
    )
}

fn builtin_specs() -> Vec<PolicySpec> {
    vec![
        spec(
            Category::Clothing,
            100,
            &["material", "fit/style", "colour/pattern"],
            &["material", "dimensions", "weight", "origin", "care"],
            &["Comfortable kitchen wear", "Practical everyday design", "Made for busy kitchens"],
        ),
        spec(
            Category::Electricals,
            0,
            &["three main product features"],
            &["capacity", "dimensions", "weight", "powerW", "programs", "origin", "guarantee", "care"],
            &["Core product features", "Reliable everyday performance", "Simple to operate"],
        ),
        spec(
            Category::BakewareCookware,
            50,
            &["usage", "coating/finish", "one standout feature"],
            &["material", "dimensions", "weight", "capacity", "origin", "guarantee", "care"],
            &["Made for home cooking", "Dependable everyday results", "Practical kitchen essential"],
        ),
        spec(
            Category::DiningDrinkLiving,
            80,
            &["material", "style/finish", "dimensions or capacity"],
            &["material", "capacity", "dimensions", "weight", "origin", "guarantee", "care"],
            &["Made for everyday dining", "Easy to enjoy daily", "A welcome table addition"],
        ),
        spec(
            Category::KnivesCutlery,
            30,
            &["material/steel", "key feature", "guarantee"],
            &["material", "bladeLength", "dimensions", "weight", "origin", "guarantee", "care"],
            &["Precise everyday cutting", "Comfortable balanced handling", "Made for regular use"],
        ),
        spec(
            Category::FoodPrepTools,
            60,
            &["key feature", "usage", "material"],
            &["material", "dimensions", "weight", "origin", "guarantee", "care"],
            &["Makes preparation simpler", "Practical kitchen tool", "Designed for everyday use"],
        ),
        spec(
            Category::Seasonal,
            50,
            &["occasion", "material", "one standout feature"],
            COMMON_KEYS,
            &["Made for seasonal celebrations", "Practical festive addition", "Designed for home use"],
        ),
        general_spec(),
    ]
}
