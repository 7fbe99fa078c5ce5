//! AniList GraphQL API client.
//!
//! AniList is free to query without authentication; the public rate
//! limit is 90 requests per minute.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::types::{MetadataClient, MetadataError, SeriesInfo, SeriesSearchResult};
use crate::catalog::SeriesStatus;

const SEARCH_QUERY: &str = r#"
query ($search: String) {
  Page(perPage: 10) {
    media(search: $search, type: ANIME) {
      id
      title { romaji english }
      episodes
      status
      coverImage { large }
    }
  }
}
"#;

const SERIES_QUERY: &str = r#"
query ($id: Int) {
  Media(id: $id, type: ANIME) {
    id
    title { romaji english }
    episodes
    status
    coverImage { large }
    nextAiringEpisode { episode }
  }
}
"#;

/// AniList GraphQL client.
pub struct AniListClient {
    client: Client,
    base_url: String,
}

impl AniListClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MetadataError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, MetadataError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == 429 {
            return Err(MetadataError::RateLimitExceeded);
        }
        if status == 404 {
            return Err(MetadataError::NotFound("media".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(format!("Failed to parse response: {}", e)))?;

        if let Some(errors) = envelope.errors {
            if let Some(first) = errors.first() {
                if first.status == Some(404) {
                    return Err(MetadataError::NotFound(first.message.clone()));
                }
                return Err(MetadataError::ApiError {
                    status: first.status.unwrap_or(0),
                    message: first.message.clone(),
                });
            }
        }

        envelope
            .data
            .ok_or_else(|| MetadataError::ParseError("Response has no data".to_string()))
    }
}

#[async_trait]
impl MetadataClient for AniListClient {
    async fn search(&self, query: &str) -> Result<Vec<SeriesSearchResult>, MetadataError> {
        debug!("AniList search: query='{}'", query);

        let data: SearchData = self
            .query(SEARCH_QUERY, json!({ "search": query }))
            .await?;

        Ok(data
            .page
            .media
            .into_iter()
            .map(|m| SeriesSearchResult {
                id: m.id,
                title: m.title.preferred(),
                total_episodes: m.episodes,
                status: parse_status(m.status.as_deref()),
                cover_image: m.cover_image.and_then(|c| c.large),
            })
            .collect())
    }

    async fn get_series(&self, id: i64) -> Result<SeriesInfo, MetadataError> {
        debug!("AniList get series: id={}", id);

        let data: SeriesData = self.query(SERIES_QUERY, json!({ "id": id })).await?;

        let media = data
            .media
            .ok_or_else(|| MetadataError::NotFound(format!("Series ID {}", id)))?;

        Ok(SeriesInfo {
            id: media.id,
            title: media.title.preferred(),
            total_episodes: media.episodes,
            status: parse_status(media.status.as_deref()),
            cover_image: media.cover_image.and_then(|c| c.large),
            next_episode: media.next_airing_episode.map(|e| e.episode),
        })
    }
}

fn parse_status(status: Option<&str>) -> SeriesStatus {
    match status {
        Some("FINISHED") => SeriesStatus::Concluded,
        _ => SeriesStatus::Ongoing,
    }
}

// ============================================================================
// AniList API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(rename = "Page")]
    page: PageResult,
}

#[derive(Debug, Deserialize)]
struct PageResult {
    #[serde(default)]
    media: Vec<MediaResult>,
}

#[derive(Debug, Deserialize)]
struct SeriesData {
    #[serde(rename = "Media")]
    media: Option<MediaResult>,
}

#[derive(Debug, Deserialize)]
struct MediaResult {
    id: i64,
    title: MediaTitle,
    episodes: Option<u32>,
    status: Option<String>,
    #[serde(rename = "coverImage")]
    cover_image: Option<CoverImage>,
    #[serde(rename = "nextAiringEpisode", default)]
    next_airing_episode: Option<AiringEpisode>,
}

#[derive(Debug, Deserialize)]
struct MediaTitle {
    romaji: Option<String>,
    english: Option<String>,
}

impl MediaTitle {
    fn preferred(self) -> String {
        self.english
            .or(self.romaji)
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiringEpisode {
    episode: u32,
}
