//! Consumet API client (gogoanime provider).
//!
//! Consumet exposes scraper-backed providers behind a stable REST
//! surface. No authentication is required.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::types::{EpisodeDescriptor, ResolverError, SourceResolver};

const PROVIDER: &str = "anime/gogoanime";

/// Consumet REST client.
pub struct ConsumetClient {
    client: Client,
    base_url: String,
}

impl ConsumetClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ResolverError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ResolverError> {
        let url = format!("{}/{}/{}", self.base_url, PROVIDER, path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == 404 {
            return Err(ResolverError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ResolverError::ParseError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl SourceResolver for ConsumetClient {
    async fn search_episodes(
        &self,
        title: &str,
    ) -> Result<Vec<EpisodeDescriptor>, ResolverError> {
        debug!("Consumet search: title='{}'", title);

        let search: SearchResponse = self
            .get_json(&urlencoding::encode(title))
            .await?;

        let Some(first) = search.results.into_iter().next() else {
            return Ok(Vec::new());
        };

        let info: InfoResponse = self.get_json(&format!("info/{}", first.id)).await?;

        Ok(info
            .episodes
            .into_iter()
            .map(|e| EpisodeDescriptor {
                id: e.id,
                number: e.number,
                title: e.title,
            })
            .collect())
    }

    async fn recent_episodes(&self) -> Result<Vec<(String, EpisodeDescriptor)>, ResolverError> {
        debug!("Consumet recent episodes");

        let recent: RecentResponse = self.get_json("recent-episodes").await?;

        Ok(recent
            .results
            .into_iter()
            .map(|r| {
                (
                    r.title.clone(),
                    EpisodeDescriptor {
                        id: r.episode_id,
                        number: r.episode_number,
                        title: Some(r.title),
                    },
                )
            })
            .collect())
    }

    async fn episode_sources(
        &self,
        episode_id: &str,
    ) -> Result<HashMap<String, String>, ResolverError> {
        debug!("Consumet episode sources: id={}", episode_id);

        let watch: WatchResponse = self.get_json(&format!("watch/{}", episode_id)).await?;

        let sources: HashMap<String, String> = watch
            .sources
            .into_iter()
            .filter(|s| !s.quality.is_empty() && s.quality != "backup")
            .map(|s| (s.quality, s.url))
            .collect();

        if sources.is_empty() {
            return Err(ResolverError::NoSources(episode_id.to_string()));
        }
        Ok(sources)
    }
}

// ============================================================================
// Consumet API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    episodes: Vec<EpisodeResult>,
}

#[derive(Debug, Deserialize)]
struct EpisodeResult {
    id: String,
    number: u32,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentResponse {
    #[serde(default)]
    results: Vec<RecentResult>,
}

#[derive(Debug, Deserialize)]
struct RecentResult {
    title: String,
    #[serde(rename = "episodeId")]
    episode_id: String,
    #[serde(rename = "episodeNumber")]
    episode_number: u32,
}

#[derive(Debug, Deserialize)]
struct WatchResponse {
    #[serde(default)]
    sources: Vec<SourceResult>,
}

#[derive(Debug, Deserialize)]
struct SourceResult {
    url: String,
    #[serde(default)]
    quality: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_response() {
        let body = r#"{
            "sources": [
                {"url": "http://cdn/ep-360.mp4", "quality": "360p"},
                {"url": "http://cdn/ep-720.mp4", "quality": "720p"},
                {"url": "http://cdn/backup.mp4", "quality": "backup"}
            ]
        }"#;

        let watch: WatchResponse = serde_json::from_str(body).unwrap();
        let sources: HashMap<String, String> = watch
            .sources
            .into_iter()
            .filter(|s| !s.quality.is_empty() && s.quality != "backup")
            .map(|s| (s.quality, s.url))
            .collect();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources["720p"], "http://cdn/ep-720.mp4");
        assert!(!sources.contains_key("backup"));
    }

    #[test]
    fn test_parse_recent_response() {
        let body = r#"{
            "results": [
                {"title": "Example Show", "episodeId": "example-show-episode-6", "episodeNumber": 6}
            ]
        }"#;

        let recent: RecentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(recent.results.len(), 1);
        assert_eq!(recent.results[0].episode_number, 6);
    }
}
