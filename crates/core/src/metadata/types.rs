//! Types for series metadata lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SeriesStatus;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Series not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A series hit from a title search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesSearchResult {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<u32>,
    pub status: SeriesStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Full metadata for one series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesInfo {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<u32>,
    pub status: SeriesStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Number of the next episode scheduled to air, when the upstream
    /// catalog knows it. The latest aired episode is this minus one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_episode: Option<u32>,
}

impl SeriesInfo {
    /// Highest episode number believed to have aired.
    pub fn latest_aired(&self) -> Option<u32> {
        match self.next_episode {
            Some(next) if next > 0 => Some(next - 1),
            Some(_) => Some(0),
            None => self.total_episodes,
        }
    }
}

/// Upstream catalog of series metadata and airing schedules.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Search series by title.
    async fn search(&self, query: &str) -> Result<Vec<SeriesSearchResult>, MetadataError>;

    /// Fetch one series by its upstream id.
    async fn get_series(&self, id: i64) -> Result<SeriesInfo, MetadataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_aired_from_next_episode() {
        let info = SeriesInfo {
            id: 1,
            title: "Example Show".to_string(),
            total_episodes: Some(12),
            status: SeriesStatus::Ongoing,
            cover_image: None,
            next_episode: Some(7),
        };
        assert_eq!(info.latest_aired(), Some(6));
    }

    #[test]
    fn test_latest_aired_falls_back_to_total() {
        let info = SeriesInfo {
            id: 1,
            title: "Example Show".to_string(),
            total_episodes: Some(12),
            status: SeriesStatus::Concluded,
            cover_image: None,
            next_episode: None,
        };
        assert_eq!(info.latest_aired(), Some(12));
    }

    #[test]
    fn test_latest_aired_unknown() {
        let info = SeriesInfo {
            id: 1,
            title: "Example Show".to_string(),
            total_episodes: None,
            status: SeriesStatus::Ongoing,
            cover_image: None,
            next_episode: None,
        };
        assert_eq!(info.latest_aired(), None);
    }
}
