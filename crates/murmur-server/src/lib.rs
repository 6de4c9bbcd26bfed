//! Murmur server library logic.

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod services;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use murmur_storage::{ObjectStore, UrlSigner};
use orchestrator::Orchestrator;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Action handlers.
    pub orchestrator: Orchestrator,
    /// Signs and verifies object download URLs.
    pub signer: Arc<UrlSigner>,
    /// Store backing the `/objects` route.
    pub objects: Arc<dyn ObjectStore>,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/actions", post(api::actions_handler))
        .route("/objects/{bucket}/{*key}", get(api::object_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
