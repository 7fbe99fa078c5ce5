//! Downloader configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the episode downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Directory downloaded files land in.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Quality labels to fetch, in preference order. Variants absent
    /// from a job's sources are simply skipped.
    #[serde(default = "default_qualities")]
    pub qualities: Vec<String>,
    /// Hard cap on a single file. Telegram bots refuse uploads over
    /// 2 GB, so anything bigger is not worth fetching.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per quality variant before giving up on it.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_qualities() -> Vec<String> {
    vec![
        "360p".to_string(),
        "480p".to_string(),
        "720p".to_string(),
        "1080p".to_string(),
    ]
}

fn default_max_file_size_mb() -> u64 {
    1900
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            qualities: default_qualities(),
            max_file_size_mb: default_max_file_size_mb(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl DownloaderConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DownloaderConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.qualities.len(), 4);
        assert_eq!(config.max_file_size_bytes(), 1900 * 1024 * 1024);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config: DownloaderConfig = toml::from_str(r#"qualities = ["720p"]"#).unwrap();
        assert_eq!(config.qualities, vec!["720p"]);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
    }
}
