pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/categories", get(handlers::handle_categories))
        .route("/api/generate-brand-voice", post(handlers::handle_generate))
        .route("/api/seo/validate-meta", post(handlers::handle_validate_meta))
        .with_state(state)
}
