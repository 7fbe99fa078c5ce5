//! Publishing types.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Thumbnail rendering failed: {0}")]
pub struct ThumbnailError(pub String);

/// Produces thumbnail image bytes for one episode from the series
/// title, episode number and cover image URL.
///
/// Rendering is an external concern (image fetching, resizing, text
/// overlay); the publisher only needs bytes it can attach to an
/// upload.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    async fn render(
        &self,
        series_title: &str,
        episode: u32,
        cover_url: &str,
    ) -> Result<Vec<u8>, ThumbnailError>;
}

/// What a publish pass achieved. Publishing never fails as a whole;
/// callers inspect `uploaded` to decide the job's fate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Variants that made it to the channel.
    pub uploaded: u32,
    /// Variants that did not.
    pub failed: u32,
    /// (quality, public link) per uploaded variant.
    pub links: Vec<(String, String)>,
}
