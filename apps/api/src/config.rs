use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Everything has a default; without `OPENAI_API_KEY` the service runs fallback-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub generation_timeout_secs: u64,
    pub generation_max_attempts: u32,
    pub generation_backoff_base_secs: u64,
    pub batch_concurrency: usize,
    pub content_rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            generation_timeout_secs: 120,
            generation_max_attempts: 3,
            generation_backoff_base_secs: 2,
            batch_concurrency: 4,
            content_rules_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            generation_timeout_secs: parse_env("GENERATION_TIMEOUT_SECS", defaults.generation_timeout_secs)?,
            generation_max_attempts: parse_env("GENERATION_MAX_ATTEMPTS", defaults.generation_max_attempts)?,
            generation_backoff_base_secs: parse_env(
                "GENERATION_BACKOFF_BASE_SECS",
                defaults.generation_backoff_base_secs,
            )?,
            batch_concurrency: parse_env("BATCH_CONCURRENCY", defaults.batch_concurrency)?,
            content_rules_path: optional_env("CONTENT_RULES_PATH").map(PathBuf::from),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.generation_max_attempts.max(1),
            backoff_base: Duration::from_secs(self.generation_backoff_base_secs),
            attempt_timeout: self.attempt_timeout(),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }
}

/// Set and non-blank, trimmed.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let config = Config {
            generation_max_attempts: 0,
            ..Config::default()
        };
        assert_eq!(config.retry_policy().max_attempts, 1);
    }

    #[test]
    fn test_parse_env_reports_bad_values() {
        std::env::set_var("BRANDVOICE_TEST_BAD_PORT", "eighty");
        let err = parse_env::<u16>("BRANDVOICE_TEST_BAD_PORT", 8080).unwrap_err();
        assert!(err.to_string().contains("BRANDVOICE_TEST_BAD_PORT"));
        std::env::remove_var("BRANDVOICE_TEST_BAD_PORT");

        assert_eq!(parse_env::<u16>("BRANDVOICE_TEST_UNSET", 8080).unwrap(), 8080);
    }
}
