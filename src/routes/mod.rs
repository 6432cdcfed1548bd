//! HTTP Routes

pub mod health;
pub mod model;
pub mod predict;

use crate::artifact::ArtifactInfo;
use crate::error::{ErrorKind, FieldError, RiskError};
use crate::features::PatientInput;
use crate::pipeline::RiskPipeline;
use crate::risk::PredictionResult;
use crate::stats::InferenceStats;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

/// Shared server state
pub struct AppState {
    /// Prediction pipeline over the loaded artifact
    pub pipeline: RiskPipeline,
    /// Request counters
    pub stats: RwLock<InferenceStats>,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    /// Create state around a ready pipeline
    pub fn new(pipeline: RiskPipeline) -> Self {
        Self {
            pipeline,
            stats: RwLock::new(InferenceStats::default()),
            started_at: Instant::now(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Failure description
    pub error: ErrorDetail,
}

/// Failure description
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// `validation` or `internal`
    pub kind: ErrorKind,
    /// Machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Per-field problems, validation failures only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl IntoResponse for RiskError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => {
                tracing::debug!(code = self.code(), "Rejected request: {}", self);
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Internal => {
                tracing::error!(code = self.code(), "Prediction failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = self.to_string();
        let body = ErrorResponse {
            error: ErrorDetail {
                kind: self.kind(),
                code: self.code().into(),
                message,
                details: match self {
                    RiskError::Validation(fields) => fields,
                    _ => Vec::new(),
                },
            },
        };

        (status, Json(body)).into_response()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GlucoGuard AI Engine",
        description = "Diabetes risk classification from patient health metrics"
    ),
    paths(
        predict::predict_risk,
        health::health_check,
        model::model_info,
        model::stats,
    ),
    components(
        schemas(
            PatientInput, PredictionResult,
            ErrorResponse, ErrorDetail, ErrorKind, FieldError,
            health::HealthResponse, ArtifactInfo,
            model::StatsResponse, InferenceStats
        )
    ),
    tags(
        (name = "prediction", description = "Risk inference"),
        (name = "health", description = "Health check endpoints"),
        (name = "model", description = "Loaded model and inference statistics")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the router
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/predict-risk", post(predict::predict_risk))
        .route("/health", get(health::health_check))
        .route("/model", get(model::model_info))
        .route("/stats", get(model::stats))
        .route("/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http());

    let router = if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(Arc::new(state))
}
