//! Core catalog data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a tracked series, as reported by the metadata
/// service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStatus {
    /// Still airing, new episodes expected.
    Ongoing,
    /// Finished airing.
    Concluded,
}

impl SeriesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesStatus::Ongoing => "ongoing",
            SeriesStatus::Concluded => "concluded",
        }
    }
}

/// A series on the tracking list.
///
/// `latest_episode` is the highest episode number the detector has
/// seen and enqueued; it only ever moves forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedSeries {
    /// External metadata-service id (immutable).
    pub series_id: i64,
    /// Display title.
    pub title: String,
    /// Total episodes expected, if known. Grows for ongoing series.
    pub total_episodes: Option<u32>,
    /// Lifecycle status.
    pub status: SeriesStatus,
    /// Cover image URL, used for thumbnails.
    #[serde(default)]
    pub cover_image: String,
    /// Highest episode number already detected and enqueued.
    pub latest_episode: u32,
    /// Whether the detector should check this series.
    pub active: bool,
    pub added_at: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

/// Acquisition status of an episode record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Pending,
    Downloaded,
    Published,
    Failed,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Pending => "pending",
            EpisodeStatus::Downloaded => "downloaded",
            EpisodeStatus::Published => "published",
            EpisodeStatus::Failed => "failed",
        }
    }
}

/// One detected episode of a tracked series.
///
/// (series_id, episode_number) is unique: the detector never records
/// the same episode twice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeRecord {
    pub series_id: i64,
    pub episode_number: u32,
    /// Episode display title (falls back to "Episode N").
    pub title: String,
    /// Quality label -> source URL. Empty is allowed; the download
    /// step simply finds nothing to fetch.
    pub sources: HashMap<String, String>,
    pub status: EpisodeStatus,
    pub retries: u32,
    pub added_at: DateTime<Utc>,
}
