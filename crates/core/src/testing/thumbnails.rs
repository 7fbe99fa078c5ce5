use std::sync::RwLock;

use async_trait::async_trait;

use crate::publisher::{ThumbnailError, ThumbnailRenderer};

/// Renderer that returns fixed bytes and records its calls.
#[derive(Default)]
pub struct MockThumbnailRenderer {
    calls: RwLock<Vec<(String, u32, String)>>,
    fail: RwLock<bool>,
}

impl MockThumbnailRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_renders(&self) {
        *self.fail.write().unwrap() = true;
    }

    /// (series_title, episode, cover_url) per render call.
    pub fn calls(&self) -> Vec<(String, u32, String)> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ThumbnailRenderer for MockThumbnailRenderer {
    async fn render(
        &self,
        series_title: &str,
        episode: u32,
        cover_url: &str,
    ) -> Result<Vec<u8>, ThumbnailError> {
        self.calls
            .write()
            .unwrap()
            .push((series_title.to_string(), episode, cover_url.to_string()));
        if *self.fail.read().unwrap() {
            return Err(ThumbnailError("mock failure".to_string()));
        }
        Ok(b"thumbnail bytes".to_vec())
    }
}
