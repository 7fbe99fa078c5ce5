//! Cover-art thumbnail renderer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{ThumbnailError, ThumbnailRenderer};

/// Renders upload thumbnails from the series cover art.
///
/// Fetches the cover image and hands the bytes over as-is; Telegram
/// scales thumbnails down server-side, so no local resizing is done.
pub struct CoverArtRenderer {
    client: Client,
}

impl CoverArtRenderer {
    pub fn new(timeout: Duration) -> Result<Self, ThumbnailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ThumbnailError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ThumbnailRenderer for CoverArtRenderer {
    async fn render(
        &self,
        series_title: &str,
        episode: u32,
        cover_url: &str,
    ) -> Result<Vec<u8>, ThumbnailError> {
        debug!(
            "'{}' E{:03}: fetching cover {}",
            series_title, episode, cover_url
        );

        let response = self
            .client
            .get(cover_url)
            .send()
            .await
            .map_err(|e| ThumbnailError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThumbnailError(format!(
                "cover fetch returned status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ThumbnailError(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ThumbnailError("cover fetch returned an empty body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}
