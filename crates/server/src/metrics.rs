//! Prometheus metrics for the HTTP server.
//!
//! Core pipeline metrics are registered here alongside the server's
//! own HTTP metrics; `/metrics` encodes the whole registry.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "animebot_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("animebot_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "animebot_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Tracked series gauge (collected dynamically).
pub static TRACKED_SERIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("animebot_tracked_series", "Number of tracked series").unwrap()
});

/// Queue occupancy by status (collected dynamically).
pub static QUEUE_JOBS: Lazy<prometheus::IntGaugeVec> = Lazy::new(|| {
    prometheus::IntGaugeVec::new(
        Opts::new("animebot_queue_jobs", "Queue job count by status"),
        &["status"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(TRACKED_SERIES.clone())).unwrap();
    registry.register(Box::new(QUEUE_JOBS.clone())).unwrap();

    for metric in animebot_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Refresh gauges from current application state before encoding.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Some(orchestrator) = state.orchestrator() {
        let status = orchestrator.status();
        ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    }

    if let Ok(count) = state.catalog().count_series() {
        TRACKED_SERIES.set(count);
    }

    if let Ok(counts) = state.queue().counts_by_status() {
        QUEUE_JOBS.with_label_values(&["pending"]).set(counts.pending);
        QUEUE_JOBS
            .with_label_values(&["downloading"])
            .set(counts.downloading);
        QUEUE_JOBS
            .with_label_values(&["uploading"])
            .set(counts.uploading);
        QUEUE_JOBS
            .with_label_values(&["completed"])
            .set(counts.completed);
        QUEUE_JOBS.with_label_values(&["failed"]).set(counts.failed);
    }
}

/// Normalize a path for metric labels (replace numeric ids).
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
