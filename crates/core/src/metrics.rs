//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Detection (passes, episodes found)
//! - Downloads (per-variant results, duration, bytes)
//! - Publishing (uploads, summary posts)
//! - External services (AniList, Consumet, Telegram)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Detection Metrics
// =============================================================================

/// Detection passes total.
pub static DETECTION_PASSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("animebot_detection_passes_total", "Total detection passes").unwrap()
});

/// Episodes found by the detector, by outcome.
pub static EPISODES_DETECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "animebot_episodes_detected_total",
            "Episodes seen by the detector",
        ),
        &["outcome"], // "enqueued", "skipped"
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Quality variant downloads by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "animebot_downloads_total",
            "Quality variant download attempts",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Download duration in seconds, per job.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("animebot_download_duration_seconds", "Duration of downloads")
            .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Publishing Metrics
// =============================================================================

/// Uploads by result.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("animebot_uploads_total", "Video uploads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Jobs that reached a terminal status, by status.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("animebot_jobs_finished_total", "Jobs finished"),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "animebot_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "animebot_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DETECTION_PASSES.clone()),
        Box::new(EPISODES_DETECTED.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(UPLOADS_TOTAL.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
