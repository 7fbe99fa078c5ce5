//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the acquisition orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Enable/disable the background loops.
    /// When disabled, jobs can still be driven manually via the API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often the detector checks tracked series for new episodes
    /// (seconds).
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// How often the acquisition loop polls the queue when it is
    /// empty (seconds).
    #[serde(default = "default_idle_poll")]
    pub idle_poll_secs: u64,

    /// How often the pinned status message is refreshed (seconds).
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,

    /// Pause between series within one detection pass (seconds),
    /// to spread API load.
    #[serde(default = "default_per_series_delay")]
    pub per_series_delay_secs: u64,

    /// Backoff after a job-processing error (seconds).
    #[serde(default = "default_error_cooldown")]
    pub error_cooldown_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_check_interval() -> u64 {
    600 // 10 minutes
}

fn default_idle_poll() -> u64 {
    10
}

fn default_status_interval() -> u64 {
    300 // 5 minutes
}

fn default_per_series_delay() -> u64 {
    5
}

fn default_error_cooldown() -> u64 {
    60
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: default_check_interval(),
            idle_poll_secs: default_idle_poll(),
            status_interval_secs: default_status_interval(),
            per_series_delay_secs: default_per_series_delay(),
            error_cooldown_secs: default_error_cooldown(),
        }
    }
}
