//! Acquisition orchestrator implementation.
//!
//! Runs three background loops:
//! - Detection: polls tracked series for newly aired episodes
//! - Acquisition: claims one job at a time, downloads and publishes it
//! - Status: refreshes the pinned status message in the channel

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogStore, EpisodeStatus};
use crate::config::TelegramConfig;
use crate::detector::UpdateDetector;
use crate::downloader::Downloader;
use crate::messenger::{MessageHandle, Messenger};
use crate::metrics;
use crate::publisher::Publisher;
use crate::queue::{QueueCounts, QueueError, QueueJob, QueueStore};
use crate::stats::{GlobalStats, StatsStore, COUNTER_DOWNLOADS};

use super::config::OrchestratorConfig;
use super::types::OrchestratorStatus;

/// The acquisition orchestrator - drives jobs from detection to a
/// terminal status.
pub struct Orchestrator {
    config: OrchestratorConfig,
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn QueueStore>,
    stats: Arc<dyn StatsStore>,
    detector: Arc<UpdateDetector>,
    downloader: Arc<Downloader>,
    publisher: Arc<Publisher>,
    messenger: Arc<dyn Messenger>,
    telegram: TelegramConfig,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: OrchestratorConfig,
        catalog: Arc<dyn CatalogStore>,
        queue: Arc<dyn QueueStore>,
        stats: Arc<dyn StatsStore>,
        detector: Arc<UpdateDetector>,
        downloader: Arc<Downloader>,
        publisher: Arc<Publisher>,
        messenger: Arc<dyn Messenger>,
        telegram: TelegramConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            catalog,
            queue,
            stats,
            detector,
            downloader,
            publisher,
            messenger,
            telegram,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the orchestrator (spawns background tasks).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!("Starting orchestrator");

        // Jobs left mid-flight by a crash go back to pending before
        // any loop can claim.
        match self.queue.requeue_interrupted() {
            Ok(0) => {}
            Ok(n) => info!("Requeued {} interrupted jobs", n),
            Err(e) => error!("Could not requeue interrupted jobs: {}", e),
        }

        self.spawn_detection_loop();
        self.spawn_acquisition_loop();
        self.spawn_status_loop();

        info!("Orchestrator started");
    }

    /// Stop the orchestrator gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping orchestrator");

        let _ = self.shutdown_tx.send(());

        // Give workers a moment to finish current work
        tokio::time::sleep(Duration::from_millis(500)).await;

        info!("Orchestrator stopped");
    }

    /// Get current orchestrator status.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            tracked_series: self.catalog.count_series().unwrap_or(0),
            queue: self.queue.counts_by_status().unwrap_or_default(),
            totals: self.stats.get().unwrap_or_default(),
        }
    }

    fn spawn_detection_loop(&self) {
        let running = Arc::clone(&self.running);
        let detector = Arc::clone(&self.detector);
        let interval = Duration::from_secs(self.config.check_interval_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Detection loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Detection loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        metrics::DETECTION_PASSES.inc();
                        let outcome = detector.run_cycle().await;
                        metrics::EPISODES_DETECTED
                            .with_label_values(&["enqueued"])
                            .inc_by(outcome.enqueued as u64);
                        metrics::EPISODES_DETECTED
                            .with_label_values(&["skipped"])
                            .inc_by(outcome.skipped as u64);
                        if outcome.enqueued > 0 {
                            info!("Detection pass enqueued {} jobs", outcome.enqueued);
                        }
                    }
                }
            }
            info!("Detection loop stopped");
        });
    }

    fn spawn_acquisition_loop(&self) {
        let running = Arc::clone(&self.running);
        let catalog = Arc::clone(&self.catalog);
        let queue = Arc::clone(&self.queue);
        let stats = Arc::clone(&self.stats);
        let downloader = Arc::clone(&self.downloader);
        let publisher = Arc::clone(&self.publisher);
        let idle_poll = Duration::from_secs(self.config.idle_poll_secs);
        let error_cooldown = Duration::from_secs(self.config.error_cooldown_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Acquisition loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Acquisition loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(idle_poll) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match queue.claim_next() {
                            Ok(Some(job)) => {
                                Self::process_job(&catalog, &queue, &stats, &downloader, &publisher, job).await;
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!("Could not claim a job: {}", e);
                                tokio::time::sleep(error_cooldown).await;
                            }
                        }
                    }
                }
            }
            info!("Acquisition loop stopped");
        });
    }

    fn spawn_status_loop(&self) {
        if self.telegram.status_message_id == 0 {
            debug!("Status message disabled");
            return;
        }

        let running = Arc::clone(&self.running);
        let catalog = Arc::clone(&self.catalog);
        let queue = Arc::clone(&self.queue);
        let stats = Arc::clone(&self.stats);
        let messenger = Arc::clone(&self.messenger);
        let handle = MessageHandle {
            chat_id: self.telegram.uploads_channel_id,
            message_id: self.telegram.status_message_id,
        };
        let channel_title = self.telegram.channel_title.clone();
        let interval = Duration::from_secs(self.config.status_interval_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Status loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Status loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let text = format_status_message(
                            &channel_title,
                            catalog.count_series().unwrap_or(0),
                            &queue.counts_by_status().unwrap_or_default(),
                            &stats.get().unwrap_or_default(),
                        );
                        if let Err(e) = messenger.edit_text(handle, &text).await {
                            warn!("Could not refresh status message: {}", e);
                        }
                    }
                }
            }
            info!("Status loop stopped");
        });
    }

    /// Drive one claimed job to a terminal status.
    ///
    /// The job is already in `Downloading`. Exactly one of
    /// `complete`/`fail` is applied at the end, whatever happens in
    /// between.
    pub async fn process_job(
        catalog: &Arc<dyn CatalogStore>,
        queue: &Arc<dyn QueueStore>,
        stats: &Arc<dyn StatsStore>,
        downloader: &Arc<Downloader>,
        publisher: &Arc<Publisher>,
        job: QueueJob,
    ) {
        info!(
            "Processing job {}: '{}' E{:03}",
            job.id, job.series_title, job.episode_number
        );

        let timer = metrics::DOWNLOAD_DURATION.with_label_values(&[]).start_timer();
        let files = downloader
            .download_episode(&job.series_title, job.episode_number, &job.sources)
            .await;
        timer.observe_duration();

        metrics::DOWNLOADS_TOTAL
            .with_label_values(&["success"])
            .inc_by(files.len() as u64);

        if files.is_empty() {
            metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
            Self::finish_failed(catalog, queue, &job, "no quality variants downloaded");
            return;
        }

        if let Err(e) = stats.increment(COUNTER_DOWNLOADS, files.len() as i64) {
            warn!("Could not bump download counter: {}", e);
        }
        if let Err(e) =
            catalog.set_episode_status(job.series_id, job.episode_number, EpisodeStatus::Downloaded)
        {
            warn!("Could not mark episode downloaded: {}", e);
        }

        match queue.mark_uploading(&job.id) {
            Ok(()) => {}
            Err(e @ (QueueError::NotFound(_) | QueueError::InvalidState { .. })) => {
                // The job vanished or was finished elsewhere;
                // publishing would duplicate uploads.
                error!("Could not move job {} to uploading: {}", job.id, e);
                return;
            }
            Err(e) => {
                // Transient store error. Keep going: bailing out here
                // would strand the claimed job in downloading with no
                // terminal status until the next restart.
                warn!("Could not move job {} to uploading: {}", job.id, e);
            }
        }

        let outcome = publisher.publish(&job, &files).await;
        metrics::UPLOADS_TOTAL
            .with_label_values(&["success"])
            .inc_by(outcome.uploaded as u64);
        metrics::UPLOADS_TOTAL
            .with_label_values(&["failed"])
            .inc_by(outcome.failed as u64);

        if outcome.uploaded > 0 {
            match queue.complete(&job.id) {
                Ok(()) => {
                    metrics::JOBS_FINISHED.with_label_values(&["completed"]).inc();
                    info!(
                        "Job {} completed: {}/{} variants published",
                        job.id,
                        outcome.uploaded,
                        files.len()
                    );
                }
                Err(e) => error!("Could not complete job {}: {}", job.id, e),
            }
        } else {
            Self::finish_failed(catalog, queue, &job, "no variants uploaded");
        }
    }

    fn finish_failed(
        catalog: &Arc<dyn CatalogStore>,
        queue: &Arc<dyn QueueStore>,
        job: &QueueJob,
        reason: &str,
    ) {
        warn!("Job {} failed: {}", job.id, reason);
        metrics::JOBS_FINISHED.with_label_values(&["failed"]).inc();

        if let Err(e) = queue.fail(&job.id, reason) {
            error!("Could not fail job {}: {}", job.id, e);
        }
        if let Err(e) =
            catalog.set_episode_status(job.series_id, job.episode_number, EpisodeStatus::Failed)
        {
            warn!("Could not mark episode failed: {}", e);
        }
    }
}

/// Render the pinned status message.
fn format_status_message(
    channel_title: &str,
    tracked_series: i64,
    counts: &QueueCounts,
    totals: &GlobalStats,
) -> String {
    format!(
        "\u{1F4E1} <b>{} Status</b>\n\n\
         Tracked series: {}\n\
         Queue: {} pending, {} active, {} done, {} failed\n\
         Lifetime: {} downloads, {} uploads\n\n\
         Updated: {}",
        channel_title,
        tracked_series,
        counts.pending,
        counts.downloading + counts.uploading,
        counts.completed,
        counts.failed,
        totals.total_downloads,
        totals.total_uploads,
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
    )
}
