//! Catalog storage trait.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{EpisodeRecord, EpisodeStatus, SeriesStatus, TrackedSeries};

/// Error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Series not found: {0}")]
    SeriesNotFound(i64),

    #[error("Series already tracked: {0}")]
    DuplicateSeries(i64),

    #[error("Episode already recorded: series {series_id} episode {episode_number}")]
    DuplicateEpisode { series_id: i64, episode_number: u32 },

    #[error("Database error: {0}")]
    Database(String),
}

/// Request to start tracking a series.
#[derive(Debug, Clone)]
pub struct AddSeriesRequest {
    pub series_id: i64,
    pub title: String,
    pub total_episodes: Option<u32>,
    pub status: SeriesStatus,
    pub cover_image: String,
}

/// Durable record of tracked series and their detected episodes.
///
/// Sync trait over a `Mutex<Connection>` implementation: calls are
/// short and the callers are all async tasks that tolerate the brief
/// blocking, same trade-off the rest of the stores make.
pub trait CatalogStore: Send + Sync {
    /// Add a series to the tracking list. Refuses duplicates by
    /// external id.
    fn add_series(&self, request: AddSeriesRequest) -> Result<TrackedSeries, CatalogError>;

    /// Remove a series from tracking. Its episode records are kept.
    fn remove_series(&self, series_id: i64) -> Result<TrackedSeries, CatalogError>;

    fn get_series(&self, series_id: i64) -> Result<Option<TrackedSeries>, CatalogError>;

    /// List tracked series, optionally restricted to active ones.
    fn list_series(&self, active_only: bool) -> Result<Vec<TrackedSeries>, CatalogError>;

    /// Advance a series' latest seen episode and stamp last_checked.
    /// The stored value never decreases.
    fn update_latest_episode(
        &self,
        series_id: i64,
        episode_number: u32,
    ) -> Result<(), CatalogError>;

    /// Stamp last_checked without advancing the episode counter.
    fn touch_series(&self, series_id: i64, at: DateTime<Utc>) -> Result<(), CatalogError>;

    /// Insert an episode record. Refuses duplicates on
    /// (series_id, episode_number).
    fn insert_episode(&self, record: &EpisodeRecord) -> Result<(), CatalogError>;

    fn episode_exists(&self, series_id: i64, episode_number: u32) -> Result<bool, CatalogError>;

    fn get_episode(
        &self,
        series_id: i64,
        episode_number: u32,
    ) -> Result<Option<EpisodeRecord>, CatalogError>;

    /// Set the acquisition status of an episode record.
    fn set_episode_status(
        &self,
        series_id: i64,
        episode_number: u32,
        status: EpisodeStatus,
    ) -> Result<(), CatalogError>;

    /// Number of tracked (active) series.
    fn count_series(&self) -> Result<i64, CatalogError>;
}
