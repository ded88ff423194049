mod catalog;
mod config;
mod contract;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod rules;
mod sanitize;
mod seo;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::PolicyRegistry;
use crate::config::Config;
use crate::generation::Pipeline;
use crate::llm_client::{GenerationClient, LlmClient};
use crate::routes::build_router;
use crate::rules::ContentRules;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Brandvoice API v{}", env!("CARGO_PKG_VERSION"));

    // Content rules and category policies are read once and shared read-only
    let rules = Arc::new(ContentRules::load(config.content_rules_path.as_deref())?);
    let registry = match &rules.categories {
        Some(specs) => PolicyRegistry::from_specs(specs.clone())?,
        None => PolicyRegistry::builtin(),
    };
    info!(
        "Content rules loaded: {} forbidden phrase(s), {} category policies",
        rules.forbidden_phrases.len(),
        registry.policies().len()
    );

    let generator = match &config.openai_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone(), &config.openai_base_url, config.attempt_timeout())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(GenerationClient::new(Arc::new(client), config.retry_policy()))
        }
        None => {
            warn!("OPENAI_API_KEY not set, every product will use fallback copy");
            None
        }
    };

    let pipeline = Pipeline::new(rules, Arc::new(registry), generator);
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
