//! Streaming episode downloads with per-variant retry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::DownloaderConfig;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Server returned status {0}")]
    BadStatus(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One successfully downloaded quality variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub quality: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

enum AttemptOutcome {
    Succeeded(DownloadedFile),
    /// Oversized files are abandoned without retrying; the size will
    /// not shrink on the next attempt.
    TooLarge(DownloadError),
    Transient(DownloadError),
}

/// Downloads every available quality variant of an episode.
pub struct Downloader {
    client: Client,
    config: DownloaderConfig,
}

impl Downloader {
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Deterministic target path for one variant, derived from the
    /// series title, episode number and quality label.
    pub fn episode_file_path(&self, series_title: &str, episode: u32, quality: &str) -> PathBuf {
        let filename = format!(
            "{}_E{:03}_{}.mp4",
            sanitize_title(series_title),
            episode,
            quality
        );
        self.config.download_dir.join(filename)
    }

    /// Download every configured quality that the job has a source
    /// for. Variants fail independently: one bad URL does not abort
    /// the others. Returns the variants that made it to disk, which
    /// may be empty.
    pub async fn download_episode(
        &self,
        series_title: &str,
        episode: u32,
        sources: &HashMap<String, String>,
    ) -> Vec<DownloadedFile> {
        if let Err(e) = tokio::fs::create_dir_all(&self.config.download_dir).await {
            warn!(
                "Could not create download directory {}: {}",
                self.config.download_dir.display(),
                e
            );
            return Vec::new();
        }

        let mut files = Vec::new();

        for quality in &self.config.qualities {
            let Some(url) = sources.get(quality) else {
                debug!("'{}' E{:03}: no {} source", series_title, episode, quality);
                continue;
            };

            match self
                .download_variant(series_title, episode, quality, url)
                .await
            {
                Ok(file) => {
                    info!(
                        "'{}' E{:03} {}: downloaded {} bytes",
                        series_title, episode, quality, file.size_bytes
                    );
                    files.push(file);
                }
                Err(e) => {
                    warn!(
                        "'{}' E{:03} {}: download failed: {}",
                        series_title, episode, quality, e
                    );
                }
            }
        }

        files
    }

    /// Download one quality variant, retrying transient failures up to
    /// the configured attempt count.
    async fn download_variant(
        &self,
        series_title: &str,
        episode: u32,
        quality: &str,
        url: &str,
    ) -> Result<DownloadedFile, DownloadError> {
        let path = self.episode_file_path(series_title, episode, quality);

        // A previous run may have finished this variant already.
        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            if metadata.len() > 0 {
                debug!("{} already on disk, skipping", path.display());
                return Ok(DownloadedFile {
                    quality: quality.to_string(),
                    path,
                    size_bytes: metadata.len(),
                });
            }
        }

        let mut last_error = None;
        for attempt in 1..=self.config.max_retries {
            match self.attempt(quality, url, &path).await {
                AttemptOutcome::Succeeded(file) => return Ok(file),
                AttemptOutcome::TooLarge(e) => return Err(e),
                AttemptOutcome::Transient(e) => {
                    debug!(
                        "{} attempt {}/{} failed: {}",
                        path.display(),
                        attempt,
                        self.config.max_retries,
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs))
                            .await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(DownloadError::BadStatus(0)))
    }

    async fn attempt(&self, quality: &str, url: &str, path: &Path) -> AttemptOutcome {
        let limit = self.config.max_file_size_bytes();

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return AttemptOutcome::Transient(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return AttemptOutcome::Transient(DownloadError::BadStatus(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > limit {
                return AttemptOutcome::TooLarge(DownloadError::TooLarge {
                    size: length,
                    limit,
                });
            }
        }

        let mut file = match tokio::fs::File::create(path).await {
            Ok(f) => f,
            Err(e) => return AttemptOutcome::Transient(e.into()),
        };

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    drop(file);
                    remove_partial(path).await;
                    return AttemptOutcome::Transient(e.into());
                }
            };

            written += chunk.len() as u64;
            if written > limit {
                drop(file);
                remove_partial(path).await;
                return AttemptOutcome::TooLarge(DownloadError::TooLarge {
                    size: written,
                    limit,
                });
            }

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                remove_partial(path).await;
                return AttemptOutcome::Transient(e.into());
            }
        }

        if let Err(e) = file.flush().await {
            drop(file);
            remove_partial(path).await;
            return AttemptOutcome::Transient(e.into());
        }

        debug!("{} {}: wrote {} bytes", path.display(), quality, written);
        AttemptOutcome::Succeeded(DownloadedFile {
            quality: quality.to_string(),
            path: path.to_path_buf(),
            size_bytes: written,
        })
    }
}

/// Remove a half-written file; a leftover partial would be mistaken
/// for a finished download on the next attempt.
async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Could not remove partial file {}: {}", path.display(), e);
    }
}

/// Reduce a series title to a filesystem-safe stem: keep only
/// alphanumerics, spaces, hyphens and underscores, then turn spaces
/// into underscores.
pub fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();
    kept.trim().replace(' ', "_")
}
