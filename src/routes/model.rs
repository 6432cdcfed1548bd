//! Model and statistics endpoints

use super::AppState;
use crate::artifact::ArtifactInfo;
use crate::stats::InferenceStats;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Statistics body
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// Counters
    #[serde(flatten)]
    pub stats: InferenceStats,
    /// Average latency in microseconds
    pub avg_latency_us: f64,
    /// Seconds since the server started
    pub uptime_secs: u64,
}

/// Describe the loaded artifact
#[utoipa::path(
    get,
    path = "/model",
    responses(
        (status = 200, description = "Loaded artifact", body = ArtifactInfo)
    ),
    tag = "model"
)]
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ArtifactInfo> {
    Json(state.pipeline.artifact().info().clone())
}

/// Inference counters
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Inference statistics", body = StatsResponse)
    ),
    tag = "model"
)]
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.stats.read().clone();
    Json(StatsResponse {
        avg_latency_us: stats.avg_latency_us(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        stats,
    })
}
