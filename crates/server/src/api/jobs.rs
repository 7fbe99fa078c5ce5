//! Queue inspection API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use animebot_core::queue::{JobStatus, QueueJob};

use crate::state::AppState;

const MAX_LIMIT: u32 = 500;
const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    /// Status to filter on (default: pending).
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub series_id: i64,
    pub series_title: String,
    pub episode_number: u32,
    pub sources: HashMap<String, String>,
    pub status: JobStatus,
    pub priority: i32,
    pub enqueued_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub retries: u32,
    pub error_message: Option<String>,
}

impl From<QueueJob> for JobResponse {
    fn from(job: QueueJob) -> Self {
        Self {
            id: job.id,
            series_id: job.series_id,
            series_title: job.series_title,
            episode_number: job.episode_number,
            sources: job.sources,
            status: job.status,
            priority: job.priority,
            enqueued_at: job.enqueued_at.to_rfc3339(),
            started_at: job.started_at.map(|t| t.to_rfc3339()),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
            retries: job.retries,
            error_message: job.error_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

/// List queue jobs by status.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<ListJobsResponse>, impl IntoResponse> {
    let status_str = params.status.as_deref().unwrap_or("pending");
    let Some(status) = JobStatus::from_str(status_str) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(JobErrorResponse {
                error: format!("Unknown status: {}", status_str),
            }),
        ));
    };

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    match state.queue().list_by_status(status, limit) {
        Ok(jobs) => {
            let jobs: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();
            let total = jobs.len();
            Ok(Json(ListJobsResponse { jobs, total }))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(JobErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
