//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::constants::APP_VERSION;
use crate::ml::ModelStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: ModelHealth,
}

#[derive(Serialize)]
pub struct ModelHealth {
    #[serde(flatten)]
    status: ModelStatus,
    inference_count: u64,
    avg_latency_ms: f32,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: APP_VERSION,
        timestamp: chrono::Utc::now().timestamp(),
        model: ModelHealth {
            status: state.model.status(),
            inference_count: state.stats.count(),
            avg_latency_ms: state.stats.avg_latency_ms(),
        },
    })
}
