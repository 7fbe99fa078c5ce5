//! New-episode detection.
//!
//! Compares the upstream airing state of each tracked series against
//! the highest episode already seen, resolves media sources for the
//! gap, and enqueues one acquisition job per new episode.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogStore, EpisodeRecord, EpisodeStatus};
use crate::metadata::{MetadataClient, MetadataError};
use crate::queue::{EnqueueRequest, QueueError, QueueStore};
use crate::resolver::{ResolverError, SourceResolver};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Result of checking one series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionOutcome {
    /// Jobs enqueued in this pass.
    pub enqueued: u32,
    /// Episodes seen upstream but skipped (already known, already
    /// queued, or no usable sources).
    pub skipped: u32,
}

/// Polls tracked series for newly aired episodes.
pub struct UpdateDetector {
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn QueueStore>,
    metadata: Arc<dyn MetadataClient>,
    resolver: Arc<dyn SourceResolver>,
    per_series_delay: Duration,
}

impl UpdateDetector {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        queue: Arc<dyn QueueStore>,
        metadata: Arc<dyn MetadataClient>,
        resolver: Arc<dyn SourceResolver>,
        per_series_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            queue,
            metadata,
            resolver,
            per_series_delay,
        }
    }

    /// Check one series and enqueue jobs for any newly aired episodes.
    ///
    /// A failure on one episode (missing sources, duplicate job) skips
    /// that episode and moves on; the high-water mark only advances
    /// past episodes that were actually recorded.
    pub async fn detect(&self, series_id: i64) -> Result<DetectionOutcome, DetectorError> {
        let series = self
            .catalog
            .get_series(series_id)?
            .ok_or(CatalogError::SeriesNotFound(series_id))?;

        let info = self.metadata.get_series(series.series_id).await?;

        let Some(latest_aired) = info.latest_aired() else {
            debug!("'{}': upstream has no airing information", series.title);
            self.catalog
                .touch_series(series.series_id, chrono::Utc::now())?;
            return Ok(DetectionOutcome::default());
        };

        if latest_aired <= series.latest_episode {
            debug!(
                "'{}': no new episodes (aired {}, seen {})",
                series.title, latest_aired, series.latest_episode
            );
            self.catalog
                .touch_series(series.series_id, chrono::Utc::now())?;
            return Ok(DetectionOutcome::default());
        }

        info!(
            "'{}': episodes {}..={} newly aired",
            series.title,
            series.latest_episode + 1,
            latest_aired
        );

        let episodes = self.resolver.search_episodes(&series.title).await?;
        let mut outcome = DetectionOutcome::default();

        for episode in episodes {
            if episode.number <= series.latest_episode || episode.number > latest_aired {
                continue;
            }

            if self
                .catalog
                .episode_exists(series.series_id, episode.number)?
            {
                debug!(
                    "'{}' episode {} already recorded",
                    series.title, episode.number
                );
                outcome.skipped += 1;
                continue;
            }

            let sources = match self.resolver.episode_sources(&episode.id).await {
                Ok(sources) => sources,
                Err(e) => {
                    warn!(
                        "'{}' episode {}: could not resolve sources: {}",
                        series.title, episode.number, e
                    );
                    outcome.skipped += 1;
                    continue;
                }
            };

            self.catalog.insert_episode(&EpisodeRecord {
                series_id: series.series_id,
                episode_number: episode.number,
                title: episode
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Episode {}", episode.number)),
                sources: sources.clone(),
                status: EpisodeStatus::Pending,
                retries: 0,
                added_at: chrono::Utc::now(),
            })?;

            match self.queue.enqueue(EnqueueRequest {
                series_id: series.series_id,
                series_title: series.title.clone(),
                episode_number: episode.number,
                sources,
                priority: 0,
            }) {
                Ok(job) => {
                    info!(
                        "'{}' episode {}: enqueued job {}",
                        series.title, episode.number, job.id
                    );
                    outcome.enqueued += 1;
                }
                Err(QueueError::Duplicate { .. }) => {
                    debug!(
                        "'{}' episode {} already queued",
                        series.title, episode.number
                    );
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }

            self.catalog
                .update_latest_episode(series.series_id, episode.number)?;
        }

        self.catalog
            .touch_series(series.series_id, chrono::Utc::now())?;
        Ok(outcome)
    }

    /// Run one detection pass over every active series.
    ///
    /// Errors on one series are logged and do not stop the pass.
    pub async fn run_cycle(&self) -> DetectionOutcome {
        let series_list = match self.catalog.list_series(true) {
            Ok(list) => list,
            Err(e) => {
                warn!("Could not list tracked series: {}", e);
                return DetectionOutcome::default();
            }
        };

        let mut total = DetectionOutcome::default();
        let mut first = true;

        for series in series_list {
            if !first && !self.per_series_delay.is_zero() {
                tokio::time::sleep(self.per_series_delay).await;
            }
            first = false;

            match self.detect(series.series_id).await {
                Ok(outcome) => {
                    total.enqueued += outcome.enqueued;
                    total.skipped += outcome.skipped;
                }
                Err(e) => {
                    warn!("Detection failed for '{}': {}", series.title, e);
                }
            }
        }

        total
    }
}
