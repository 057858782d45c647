//! Route definitions

use std::sync::Arc;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Visit / for the web form or /api/health to check API status.",
        })),
    )
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": true,
            "message": "Method not allowed.",
        })),
    )
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/predict", post(handlers::predict))
        .route("/schema", get(handlers::get_schema))
        .route("/health", get(handlers::health_check))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405);

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(handlers::serve_index))
        .route("/predict", post(handlers::predict_form))
        .route("/report", post(handlers::download_report))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
