//! Work queue data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of a queued acquisition job.
///
/// Lifecycle:
/// ```text
/// Pending -> Downloading -> Uploading -> Completed
///                 |              |
///                 v              v
///               Failed         Failed
/// ```
/// Completed and Failed are terminal; a job never leaves a terminal
/// status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Downloading,
    Uploading,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "downloading" => Some(JobStatus::Downloading),
            "uploading" => Some(JobStatus::Uploading),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One acquisition job: download every available quality of one
/// episode and publish the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueJob {
    /// Unique identifier (UUID).
    pub id: String,
    pub series_id: i64,
    pub series_title: String,
    pub episode_number: u32,
    /// Quality label -> source URL, snapshot taken at detection time.
    pub sources: HashMap<String, String>,
    pub status: JobStatus,
    /// Higher runs sooner.
    pub priority: i32,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retries: u32,
    pub error_message: Option<String>,
}

/// Request to enqueue a new job.
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub series_id: i64,
    pub series_title: String,
    pub episode_number: u32,
    pub sources: HashMap<String, String>,
    pub priority: i32,
}

/// Job counts per status, for status reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: i64,
    pub downloading: i64,
    pub uploading: i64,
    pub completed: i64,
    pub failed: i64,
}

impl QueueCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.downloading + self.uploading + self.completed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(!JobStatus::Uploading.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Downloading,
            JobStatus::Uploading,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_counts_total() {
        let counts = QueueCounts {
            pending: 2,
            downloading: 1,
            uploading: 0,
            completed: 5,
            failed: 1,
        };
        assert_eq!(counts.total(), 9);
    }
}
