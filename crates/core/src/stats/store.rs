//! Global counter storage trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Lifetime totals across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalStats {
    pub total_downloads: i64,
    pub total_uploads: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Store for named monotonically increasing counters.
pub trait StatsStore: Send + Sync {
    /// Add `delta` to the named counter, creating it at zero if absent.
    fn increment(&self, name: &str, delta: i64) -> Result<(), StatsError>;

    fn get(&self) -> Result<GlobalStats, StatsError>;
}

/// Counter names used by the pipeline.
pub const COUNTER_DOWNLOADS: &str = "total_downloads";
pub const COUNTER_UPLOADS: &str = "total_uploads";
