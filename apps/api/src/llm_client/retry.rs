//! Bounded-retry generation client.
//!
//! Wraps a `CompletionProvider` with a per-attempt timeout and exponential backoff
//! (`base * 2^(n-1)` after failed attempt `n`). Non-retryable errors stop immediately.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::{CompletionProvider, LlmError};
use crate::generation::request::GenerationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1 << exponent)
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no completion provider configured")]
    Unavailable,

    #[error("generation failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn CompletionProvider>,
    policy: RetryPolicy,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn CompletionProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Raw model text for `request`, or the last error once attempts run out.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let call = self.provider.complete(request.system(), request.user());
            let error = match tokio::time::timeout(self.policy.attempt_timeout, call).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    debug!(
                        "Generation for '{}' succeeded on attempt {}",
                        request.product_name(),
                        attempt
                    );
                    return Ok(text);
                }
                Ok(Ok(_)) => LlmError::EmptyContent,
                Ok(Err(e)) => e,
                Err(_) => LlmError::Timeout {
                    secs: self.policy.attempt_timeout.as_secs(),
                },
            };

            if attempt >= max_attempts || !error.is_retryable() {
                return Err(GenerationError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.policy.backoff_for(attempt);
            warn!(
                "Generation attempt {} for '{}' failed ({}), retrying after {}ms...",
                attempt,
                request.product_name(),
                error,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
