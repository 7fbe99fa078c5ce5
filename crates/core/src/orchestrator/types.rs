//! Types for the acquisition orchestrator.

use serde::{Deserialize, Serialize};

use crate::queue::QueueCounts;
use crate::stats::GlobalStats;

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the background loops are running.
    pub running: bool,
    /// Number of actively tracked series.
    pub tracked_series: i64,
    /// Queue occupancy by status.
    pub queue: QueueCounts,
    /// Lifetime download/upload totals.
    pub totals: GlobalStats,
}
