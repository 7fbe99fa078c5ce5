//! Tracked-series API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use animebot_core::catalog::{AddSeriesRequest, CatalogError, SeriesStatus, TrackedSeries};
use animebot_core::metadata::MetadataError;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for tracking a series.
///
/// Either `series_id` (an exact upstream id) or `query` (a title
/// search, first hit wins) must be given.
#[derive(Debug, Deserialize)]
pub struct AddSeriesBody {
    pub series_id: Option<i64>,
    pub query: Option<String>,
    /// When true, all already-aired episodes are acquired too.
    /// By default tracking starts from the current episode.
    #[serde(default)]
    pub backfill: bool,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub series_id: i64,
    pub title: String,
    pub total_episodes: Option<u32>,
    pub status: SeriesStatus,
    pub cover_image: String,
    pub latest_episode: u32,
    pub active: bool,
    pub added_at: String,
    pub last_checked: String,
}

impl From<TrackedSeries> for SeriesResponse {
    fn from(series: TrackedSeries) -> Self {
        Self {
            series_id: series.series_id,
            title: series.title,
            total_episodes: series.total_episodes,
            status: series.status,
            cover_image: series.cover_image,
            latest_episode: series.latest_episode,
            active: series.active,
            added_at: series.added_at.to_rfc3339(),
            last_checked: series.last_checked.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListSeriesResponse {
    pub series: Vec<SeriesResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SeriesErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> (StatusCode, Json<SeriesErrorResponse>) {
    (
        status,
        Json(SeriesErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Start tracking a series.
pub async fn add_series(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddSeriesBody>,
) -> Result<(StatusCode, Json<SeriesResponse>), impl IntoResponse> {
    let series_id = match (body.series_id, &body.query) {
        (Some(id), _) => id,
        (None, Some(query)) => {
            let results = state.metadata().search(query).await.map_err(|e| match e {
                MetadataError::RateLimitExceeded => {
                    error_response(StatusCode::TOO_MANY_REQUESTS, e)
                }
                _ => error_response(StatusCode::BAD_GATEWAY, e),
            })?;
            match results.first() {
                Some(hit) => hit.id,
                None => {
                    return Err(error_response(
                        StatusCode::NOT_FOUND,
                        format!("No series found for '{}'", query),
                    ))
                }
            }
        }
        (None, None) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Either series_id or query is required",
            ))
        }
    };

    let info = state.metadata().get_series(series_id).await.map_err(|e| match e {
        MetadataError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e),
        MetadataError::RateLimitExceeded => error_response(StatusCode::TOO_MANY_REQUESTS, e),
        _ => error_response(StatusCode::BAD_GATEWAY, e),
    })?;

    let series = state
        .catalog()
        .add_series(AddSeriesRequest {
            series_id: info.id,
            title: info.title.clone(),
            total_episodes: info.total_episodes,
            status: info.status,
            cover_image: info.cover_image.clone().unwrap_or_default(),
        })
        .map_err(|e| match e {
            CatalogError::DuplicateSeries(_) => error_response(StatusCode::CONFLICT, e),
            _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
        })?;

    // Without backfill, aired episodes count as already seen and only
    // future ones get acquired.
    let mut series = series;
    if !body.backfill {
        if let Some(latest_aired) = info.latest_aired() {
            if latest_aired > 0 {
                state
                    .catalog()
                    .update_latest_episode(series.series_id, latest_aired)
                    .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e))?;
                series.latest_episode = latest_aired;
            }
        }
    }

    info!(
        "Now tracking '{}' ({}), from episode {}",
        series.title, series.series_id, series.latest_episode
    );
    Ok((StatusCode::CREATED, Json(SeriesResponse::from(series))))
}

/// List tracked series.
pub async fn list_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListSeriesResponse>, impl IntoResponse> {
    match state.catalog().list_series(false) {
        Ok(series) => {
            let series: Vec<SeriesResponse> =
                series.into_iter().map(SeriesResponse::from).collect();
            let total = series.len();
            Ok(Json(ListSeriesResponse { series, total }))
        }
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

/// Get one tracked series.
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SeriesResponse>, impl IntoResponse> {
    match state.catalog().get_series(id) {
        Ok(Some(series)) => Ok(Json(SeriesResponse::from(series))),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Series not found: {}", id),
        )),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}

/// Stop tracking a series.
pub async fn remove_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SeriesResponse>, impl IntoResponse> {
    match state.catalog().remove_series(id) {
        Ok(series) => {
            info!("Stopped tracking '{}' ({})", series.title, series.series_id);
            Ok(Json(SeriesResponse::from(series)))
        }
        Err(CatalogError::SeriesNotFound(_)) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Series not found: {}", id),
        )),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}
