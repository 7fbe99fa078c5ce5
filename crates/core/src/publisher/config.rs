//! Publisher configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Attach a rendered thumbnail to each upload.
    #[serde(default = "default_true")]
    pub enable_thumbnails: bool,
    /// Attach vote buttons to each upload.
    #[serde(default = "default_true")]
    pub enable_voting: bool,
    /// Remove local files once their upload succeeded.
    #[serde(default = "default_true")]
    pub delete_after_upload: bool,
    /// Pause between consecutive uploads, to stay under the API's
    /// flood limits.
    #[serde(default = "default_upload_sleep_secs")]
    pub upload_sleep_secs: u64,
    /// Directory rendered thumbnails are cached in.
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_upload_sleep_secs() -> u64 {
    3
}

fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("thumbnails")
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enable_thumbnails: true,
            enable_voting: true,
            delete_after_upload: true,
            upload_sleep_secs: default_upload_sleep_secs(),
            thumbnail_dir: default_thumbnail_dir(),
        }
    }
}
