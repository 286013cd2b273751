//! Liveness and fallback handlers shared by every service.

use axum::{Json, Router, http::Uri, routing::get};
use flock_common::AppError;
use serde_json::{Value, json};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

/// Plain-text `GET /` route announcing the service.
pub fn banner<S>(service: &'static str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/",
        get(move || async move { format!("{service} API is running....") }),
    )
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not Found - {}", uri.path()))
}
