use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use animebot_core::stats::GlobalStats;
use animebot_core::{OrchestratorStatus, SanitizedConfig};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    let status = match state.orchestrator() {
        Some(orchestrator) => orchestrator.status(),
        // No orchestrator: report store-derived numbers with the
        // loops marked as not running.
        None => OrchestratorStatus {
            running: false,
            tracked_series: state.catalog().count_series().unwrap_or(0),
            queue: state.queue().counts_by_status().unwrap_or_default(),
            totals: state.stats().get().unwrap_or_default(),
        },
    };
    Json(status)
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<GlobalStats> {
    Json(state.stats().get().unwrap_or_default())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    crate::metrics::collect_dynamic_metrics(&state);
    crate::metrics::encode_metrics()
}
