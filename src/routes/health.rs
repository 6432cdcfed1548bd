//! Health check endpoint

use axum::{Json, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

/// Health check body
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `healthy` once serving
    pub status: String,
    /// Artifact loaded; the server does not start without one
    pub model_loaded: bool,
    /// Service version
    pub version: String,
    /// Current time, RFC 3339
    pub timestamp: String,
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".into(),
        model_loaded: true,
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
