use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Answers even when the provider is not configured.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "relay-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
