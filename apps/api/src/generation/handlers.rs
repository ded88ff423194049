//! Axum route handlers for the brand voice API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::CategoryPolicy;
use crate::errors::AppError;
use crate::models::{ProcessedProduct, ProductFacts};
use crate::seo::MetaReport;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Either a `products` array or a single `productData` object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandVoiceRequest {
    #[serde(default)]
    pub products: Vec<ProductFacts>,
    pub product_data: Option<ProductFacts>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrandVoiceResponse {
    pub success: bool,
    pub products: Vec<ProcessedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateMetaRequest {
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryPolicy>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-brand-voice
///
/// Runs every product through the pipeline. Per-product failures come back as
/// placeholder bundles; only an empty request is an error.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<BrandVoiceRequest>,
) -> Result<Json<BrandVoiceResponse>, AppError> {
    let products = if !request.products.is_empty() {
        request.products
    } else if let Some(single) = request.product_data {
        vec![single]
    } else {
        return Err(AppError::Validation("No products provided".to_string()));
    };

    info!(
        "Generating brand voice for {} product(s), category hint {:?}",
        products.len(),
        request.category
    );
    let processed = state
        .pipeline
        .process_batch(products, request.category, state.config.batch_concurrency)
        .await;

    Ok(Json(BrandVoiceResponse {
        success: true,
        products: processed,
    }))
}

/// POST /api/seo/validate-meta
pub async fn handle_validate_meta(
    State(state): State<AppState>,
    Json(request): Json<ValidateMetaRequest>,
) -> Json<MetaReport> {
    let report = state.pipeline.enforcer().meta_adjuster().validate_and_fix(
        &request.meta_description,
        &request.product_name,
        &request.keywords,
    );
    Json(report)
}

/// GET /api/categories
pub async fn handle_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let categories = state
        .pipeline
        .registry()
        .policies()
        .into_iter()
        .cloned()
        .collect();
    Json(CategoriesResponse { categories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::catalog::PolicyRegistry;
    use crate::config::Config;
    use crate::generation::Pipeline;
    use crate::routes::build_router;
    use crate::rules::ContentRules;

    fn app() -> axum::Router {
        let pipeline = Pipeline::new(
            Arc::new(ContentRules::default()),
            Arc::new(PolicyRegistry::builtin()),
            None,
        );
        build_router(AppState {
            pipeline: Arc::new(pipeline),
            config: Config::default(),
        })
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_generate_single_product_data() {
        let (status, body) = post_json(
            "/api/generate-brand-voice",
            json!({
                "productData": {"name": "Compact Blender", "specifications": {"powerW": "1200"}},
                "category": "Electricals"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let product = &body["products"][0];
        assert_eq!(product["category"], "Electricals");
        assert_eq!(product["source"], "fallback");
        let meta = product["descriptions"]["metaDescription"].as_str().unwrap();
        assert!((150..=160).contains(&meta.chars().count()));
    }

    #[tokio::test]
    async fn test_generate_batch_keeps_order() {
        let (status, body) = post_json(
            "/api/generate-brand-voice",
            json!({"products": [{"name": "Whisk"}, {"name": "Mixing Bowl"}, {"sku": "NO-NAME"}]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let products = body["products"].as_array().unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0]["name"], "Whisk");
        assert_eq!(products[1]["name"], "Mixing Bowl");
        assert_eq!(products[2]["source"], "failed");
        assert_eq!(
            products[2]["descriptions"]["shortDescription"],
            "<p>Processing error occurred</p>"
        );
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_request() {
        let (status, body) = post_json("/api/generate-brand-voice", json!({"products": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_validate_meta_pads_short_input() {
        let (status, body) = post_json(
            "/api/seo/validate-meta",
            json!({
                "metaDescription": "A compact kettle that boils quickly and pours cleanly for tea, coffee and instant noodles.",
                "productName": "Compact Kettle",
                "keywords": ["stainless steel", "dishwasher safe"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let len = body["fixedLength"].as_u64().unwrap();
        assert!((150..=160).contains(&len), "{body}");
        assert!(body["issues"].as_array().unwrap().contains(&json!("meta_too_short")));
    }

    #[tokio::test]
    async fn test_categories_lists_every_policy() {
        let request = Request::builder()
            .uri("/api/categories")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let categories = body["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[2]["category"], "Electricals");
        assert_eq!(categories[2]["lifestyle_weight"], 0);
    }
}
