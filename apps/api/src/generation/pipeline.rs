//! Orchestrator: one product in, one `ProcessedProduct` out.
//!
//! Per product: `Pending → Generating → Validating → Done`, or
//! `Generating → Failed → FallbackGenerating → Done` when generation or parsing fails.
//! A product that cannot be processed at all gets the visible error placeholder; it
//! never aborts the rest of its batch.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::{CategoryPolicy, PolicyRegistry};
use crate::contract::{ContractEnforcer, ValidationOutcome};
use crate::generation::fallback::FallbackGenerator;
use crate::generation::parser::{parse_generated, GeneratedCopy, ParseError};
use crate::generation::request::{filter_specifications, PromptBuilder};
use crate::llm_client::{GenerationClient, GenerationError};
use crate::models::{present, DescriptionBundle, DescriptionSource, ProcessedProduct, ProductFacts};
use crate::rules::ContentRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Generating,
    Validating,
    Failed,
    FallbackGenerating,
    Done,
}

/// Logs each stage transition for one product.
struct StageTracker<'a> {
    product: &'a str,
    stage: Stage,
}

impl<'a> StageTracker<'a> {
    fn new(product: &'a str) -> Self {
        Self {
            product,
            stage: Stage::Pending,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!("'{}': {:?} -> {:?}", self.product, self.stage, next);
        self.stage = next;
    }
}

/// Failures that produce the error placeholder instead of a bundle.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product has no name")]
    MissingName,

    #[error("product task failed: {0}")]
    TaskFailed(String),
}

/// Why a product went down the fallback path.
#[derive(Debug, Error)]
enum GenerationFailure {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("unusable generator response: {0}")]
    Parse(#[from] ParseError),
}

pub struct Pipeline {
    registry: Arc<PolicyRegistry>,
    prompts: PromptBuilder,
    generator: Option<GenerationClient>,
    enforcer: Arc<ContractEnforcer>,
    fallback: FallbackGenerator,
}

impl Pipeline {
    /// Without a `generator` every product takes the fallback path.
    pub fn new(
        rules: Arc<ContentRules>,
        registry: Arc<PolicyRegistry>,
        generator: Option<GenerationClient>,
    ) -> Self {
        let enforcer = Arc::new(ContractEnforcer::new(Arc::clone(&rules)));
        Self {
            prompts: PromptBuilder::new(&rules, &registry),
            fallback: FallbackGenerator::new(Arc::clone(&enforcer)),
            registry,
            generator,
            enforcer,
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn enforcer(&self) -> &ContractEnforcer {
        &self.enforcer
    }

    /// The product's own category wins over the batch hint; both default to General.
    pub fn resolve_policy(&self, product: &ProductFacts, hint: Option<&str>) -> &CategoryPolicy {
        let raw = present(&product.category)
            .or_else(|| hint.map(str::trim).filter(|h| !h.is_empty()))
            .unwrap_or_default();
        self.registry.policy_for(raw)
    }

    pub async fn process(&self, product: &ProductFacts, hint: Option<&str>) -> ProcessedProduct {
        let policy = self.resolve_policy(product, hint);
        let category = policy.category;

        if product.name.trim().is_empty() {
            warn!("Skipping product without a name (sku: {:?})", product.sku);
            return self.failed(product, policy, ProductError::MissingName);
        }

        let mut tracker = StageTracker::new(product.name.trim());
        tracker.advance(Stage::Generating);

        match self.try_generate(product, policy).await {
            Ok(copy) => {
                tracker.advance(Stage::Validating);
                let (bundle, outcome) =
                    self.enforcer
                        .enforce(&copy.short_html, &copy.long_html, product, policy);
                tracker.advance(Stage::Done);
                if outcome.all_accepted() {
                    info!("Generated descriptions for '{}' ({})", product.name.trim(), category);
                } else {
                    info!(
                        "Generated descriptions for '{}' ({}), repaired: short={:?} meta={:?} long={:?}",
                        product.name.trim(),
                        category,
                        outcome.short,
                        outcome.meta,
                        outcome.long
                    );
                }
                self.assemble(product, policy, bundle, DescriptionSource::Generated, Some(outcome), None)
            }
            Err(failure) => {
                tracker.advance(Stage::Failed);
                warn!("Using fallback copy for '{}': {}", product.name.trim(), failure);
                tracker.advance(Stage::FallbackGenerating);
                let bundle = self.fallback.generate(product, policy);
                tracker.advance(Stage::Done);
                self.assemble(
                    product,
                    policy,
                    bundle,
                    DescriptionSource::Fallback,
                    None,
                    Some(failure.to_string()),
                )
            }
        }
    }

    /// Processes `products` with at most `concurrency` in flight. Results keep input order.
    pub async fn process_batch(
        self: &Arc<Self>,
        products: Vec<ProductFacts>,
        hint: Option<String>,
        concurrency: usize,
    ) -> Vec<ProcessedProduct> {
        let total = products.len();
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let hint: Option<Arc<str>> = hint.map(Arc::from);
        info!("Processing batch of {} product(s), concurrency {}", total, concurrency.max(1));

        let mut handles = Vec::with_capacity(total);
        for (index, product) in products.into_iter().enumerate() {
            let product = Arc::new(product);
            let pipeline = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let task_product = Arc::clone(&product);
            let task_hint = hint.clone();

            let handle = tokio::spawn(async move {
                // the semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                debug!("Product {}/{}: {}", index + 1, total, task_product.name);
                pipeline.process(&task_product, task_hint.as_deref()).await
            });
            handles.push((handle, product));
        }

        let mut results = Vec::with_capacity(total);
        for (handle, product) in handles {
            match handle.await {
                Ok(processed) => results.push(processed),
                Err(e) => {
                    error!("Task for '{}' failed: {}", product.name, e);
                    let policy = self.resolve_policy(&product, hint.as_deref());
                    results.push(self.failed(&product, policy, ProductError::TaskFailed(e.to_string())));
                }
            }
        }
        results
    }

    async fn try_generate(
        &self,
        product: &ProductFacts,
        policy: &CategoryPolicy,
    ) -> Result<GeneratedCopy, GenerationFailure> {
        let client = self.generator.as_ref().ok_or(GenerationError::Unavailable)?;
        let request = self.prompts.build(product, policy);
        let raw = client.generate(&request).await?;
        Ok(parse_generated(&raw)?)
    }

    fn failed(&self, product: &ProductFacts, policy: &CategoryPolicy, reason: ProductError) -> ProcessedProduct {
        self.assemble(
            product,
            policy,
            DescriptionBundle::error_placeholder(),
            DescriptionSource::Failed,
            None,
            Some(reason.to_string()),
        )
    }

    fn assemble(
        &self,
        product: &ProductFacts,
        policy: &CategoryPolicy,
        descriptions: DescriptionBundle,
        source: DescriptionSource,
        validation: Option<ValidationOutcome>,
        generation_error: Option<String>,
    ) -> ProcessedProduct {
        ProcessedProduct {
            id: present(&product.id)
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            sku: present(&product.sku).map(str::to_string),
            barcode: present(&product.barcode).map(str::to_string),
            name: product.name.trim().to_string(),
            brand: present(&product.brand).map(str::to_string),
            category: policy.category,
            specifications: filter_specifications(&product.specifications, |key| {
                self.registry.spec_allowed(policy.category, key)
            }),
            features: product.clean_features().into_iter().map(str::to_string).collect(),
            descriptions,
            source,
            validation,
            generation_error,
            generated_at: Utc::now(),
        }
    }
}
