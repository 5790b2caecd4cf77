//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{delete, hello, retrieve, upload, upload_single, virtual_directory, AppState};
use super::middleware::create_cors_layer;

/// Create the main API router.
///
/// `max_body` caps request bodies, uploads included.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String], max_body: usize) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/uploadSingle", post(upload_single))
        .route("/upload", post(upload))
        .route("/retrieve", post(retrieve))
        .route("/virtualDirectory", get(virtual_directory))
        .route("/delete", post(delete))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(max_body)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
