//! Types for episode source resolution.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Episode not found: {0}")]
    NotFound(String),

    #[error("No sources available for episode {0}")]
    NoSources(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// One episode as known to the source provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeDescriptor {
    /// Provider-side episode identifier.
    pub id: String,
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Provider that maps series titles to episode lists and episodes to
/// downloadable media URLs per quality.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Find the episodes the provider has for a series title.
    async fn search_episodes(&self, title: &str)
        -> Result<Vec<EpisodeDescriptor>, ResolverError>;

    /// Episodes that aired recently across all series.
    async fn recent_episodes(&self) -> Result<Vec<(String, EpisodeDescriptor)>, ResolverError>;

    /// Resolve one episode to quality label -> direct media URL.
    async fn episode_sources(
        &self,
        episode_id: &str,
    ) -> Result<HashMap<String, String>, ResolverError>;
}
