//! Work queue storage trait.

use thiserror::Error;

use super::{EnqueueRequest, JobStatus, QueueCounts, QueueJob};

/// Error type for queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A non-terminal job already exists for the same episode.
    /// Callers treat this as a skip, not a failure.
    #[error("Job already queued: series {series_id} episode {episode_number}")]
    Duplicate { series_id: i64, episode_number: u32 },

    #[error("Cannot {operation} job {job_id}: status is {status}")]
    InvalidState {
        job_id: String,
        status: &'static str,
        operation: &'static str,
    },

    #[error("Database error: {0}")]
    Database(String),
}

/// Durable FIFO-with-priority claim queue for acquisition jobs.
///
/// The key guarantee is `claim_next`: fetching the next pending job
/// and marking it downloading is one atomic operation, so a given job
/// is handed to exactly one worker even across processes.
pub trait QueueStore: Send + Sync {
    /// Enqueue a job. Refuses a duplicate while a non-terminal job
    /// exists for the same (series_id, episode_number); once the
    /// previous job is completed or failed, a new one may be queued.
    fn enqueue(&self, request: EnqueueRequest) -> Result<QueueJob, QueueError>;

    /// Atomically claim the next pending job: highest priority first,
    /// oldest first within a priority. The returned job is already in
    /// `Downloading` with `started_at` stamped. `None` when the queue
    /// has no pending jobs.
    fn claim_next(&self) -> Result<Option<QueueJob>, QueueError>;

    fn get(&self, id: &str) -> Result<Option<QueueJob>, QueueError>;

    /// Move a claimed job to `Uploading` (download finished, publish
    /// in progress).
    fn mark_uploading(&self, id: &str) -> Result<(), QueueError>;

    /// Terminal transition to `Completed`. Refused for jobs already
    /// in a terminal status.
    fn complete(&self, id: &str) -> Result<(), QueueError>;

    /// Terminal transition to `Failed`, recording the error and
    /// incrementing the retry counter. Refused for jobs already in a
    /// terminal status.
    fn fail(&self, id: &str, error: &str) -> Result<(), QueueError>;

    /// Flip jobs stuck in `Downloading`/`Uploading` back to `Pending`.
    /// Called once at startup to reclaim jobs orphaned by a crash.
    /// Returns the number of requeued jobs.
    fn requeue_interrupted(&self) -> Result<usize, QueueError>;

    /// Aggregate job counts by status.
    fn counts_by_status(&self) -> Result<QueueCounts, QueueError>;

    /// List jobs in a given status, newest first (for the API).
    fn list_by_status(&self, status: JobStatus, limit: u32) -> Result<Vec<QueueJob>, QueueError>;
}
