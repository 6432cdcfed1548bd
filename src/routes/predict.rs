//! Prediction endpoint

use super::AppState;
use crate::error::RiskError;
use crate::risk::PredictionResult;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;
use std::time::Instant;

/// Classify diabetes risk for one patient.
///
/// The body is validated by the pipeline rather than an extractor so that
/// every input problem is reported as a 400 with per-field details.
#[utoipa::path(
    post,
    path = "/predict-risk",
    request_body = PatientInput,
    responses(
        (status = 200, description = "Risk classification", body = PredictionResult),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Model or artifact failure", body = ErrorResponse)
    ),
    tag = "prediction"
)]
pub async fn predict_risk(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResult>, RiskError> {
    let start = Instant::now();
    let result = state.pipeline.predict_json(&body);
    let elapsed = start.elapsed();

    match &result {
        Ok(prediction) => {
            tracing::info!(
                risk_category = prediction.risk_category.key(),
                latency_us = elapsed.as_micros() as u64,
                "Prediction served"
            );
            state.stats.write().record_prediction(prediction.risk_category, elapsed);
        }
        Err(err) => state.stats.write().record_failure(err.kind(), elapsed),
    }

    result.map(Json)
}
