//! SQLite-backed work queue implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{EnqueueRequest, JobStatus, QueueCounts, QueueError, QueueJob, QueueStore};

const JOB_COLUMNS: &str = "id, series_id, series_title, episode_number, sources, status, priority, enqueued_at, started_at, completed_at, retries, error_message";

/// SQLite-backed queue store.
pub struct SqliteQueue {
    conn: Mutex<Connection>,
}

impl SqliteQueue {
    /// Open (or create) the queue at the given path.
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory queue (useful for testing).
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn =
            Connection::open_in_memory().map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                series_id INTEGER NOT NULL,
                series_title TEXT NOT NULL,
                episode_number INTEGER NOT NULL,
                sources TEXT NOT NULL,
                status TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                enqueued_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT,
                retries INTEGER NOT NULL DEFAULT 0,
                error_message TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);
            CREATE INDEX IF NOT EXISTS idx_jobs_episode ON jobs(series_id, episode_number);
            "#,
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<QueueJob> {
        let id: String = row.get(0)?;
        let series_id: i64 = row.get(1)?;
        let series_title: String = row.get(2)?;
        let episode_number: u32 = row.get(3)?;
        let sources_json: String = row.get(4)?;
        let status_str: String = row.get(5)?;
        let priority: i32 = row.get(6)?;
        let enqueued_at_str: String = row.get(7)?;
        let started_at_str: Option<String> = row.get(8)?;
        let completed_at_str: Option<String> = row.get(9)?;
        let retries: u32 = row.get(10)?;
        let error_message: Option<String> = row.get(11)?;

        let sources: HashMap<String, String> =
            serde_json::from_str(&sources_json).unwrap_or_default();

        Ok(QueueJob {
            id,
            series_id,
            series_title,
            episode_number,
            sources,
            status: JobStatus::from_str(&status_str).unwrap_or(JobStatus::Pending),
            priority,
            enqueued_at: parse_timestamp(&enqueued_at_str),
            started_at: started_at_str.as_deref().map(parse_timestamp),
            completed_at: completed_at_str.as_deref().map(parse_timestamp),
            retries,
            error_message,
        })
    }

    /// Terminal transition helper. The WHERE clause on status makes
    /// terminal states monotonic: a completed or failed job is never
    /// moved again.
    fn finish(
        &self,
        id: &str,
        status: JobStatus,
        error: Option<&str>,
        operation: &'static str,
    ) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();

        let updated = if let Some(error) = error {
            conn.execute(
                "UPDATE jobs SET status = ?, completed_at = ?, error_message = ?, retries = retries + 1 WHERE id = ? AND status NOT IN ('completed', 'failed')",
                params![status.as_str(), Utc::now().to_rfc3339(), error, id],
            )
        } else {
            conn.execute(
                "UPDATE jobs SET status = ?, completed_at = ? WHERE id = ? AND status NOT IN ('completed', 'failed')",
                params![status.as_str(), Utc::now().to_rfc3339(), id],
            )
        }
        .map_err(|e| QueueError::Database(e.to_string()))?;

        if updated == 1 {
            return Ok(());
        }

        // Distinguish "no such job" from "already terminal".
        let current: Option<String> = conn
            .query_row("SELECT status FROM jobs WHERE id = ?", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| QueueError::Database(e.to_string()))?;

        match current {
            None => Err(QueueError::NotFound(id.to_string())),
            Some(s) => Err(QueueError::InvalidState {
                job_id: id.to_string(),
                status: JobStatus::from_str(&s).map(|s| s.as_str()).unwrap_or("unknown"),
                operation,
            }),
        }
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl QueueStore for SqliteQueue {
    fn enqueue(&self, request: EnqueueRequest) -> Result<QueueJob, QueueError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        // Invariant: at most one non-terminal job per episode.
        let existing: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM jobs WHERE series_id = ? AND episode_number = ? AND status NOT IN ('completed', 'failed')",
                params![request.series_id, request.episode_number],
                |row| row.get(0),
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if existing > 0 {
            return Err(QueueError::Duplicate {
                series_id: request.series_id,
                episode_number: request.episode_number,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let sources_json = serde_json::to_string(&request.sources)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO jobs (id, series_id, series_title, episode_number, sources, status, priority, enqueued_at) VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)",
            params![
                id,
                request.series_id,
                request.series_title,
                request.episode_number,
                sources_json,
                request.priority,
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        tx.commit().map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(QueueJob {
            id,
            series_id: request.series_id,
            series_title: request.series_title,
            episode_number: request.episode_number,
            sources: request.sources,
            status: JobStatus::Pending,
            priority: request.priority,
            enqueued_at: now,
            started_at: None,
            completed_at: None,
            retries: 0,
            error_message: None,
        })
    }

    fn claim_next(&self) -> Result<Option<QueueJob>, QueueError> {
        let mut conn = self.conn.lock().unwrap();

        // Select-then-update inside one IMMEDIATE transaction: the
        // write lock is taken up front, so two claimants can never
        // pick the same row.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let job = tx
            .query_row(
                &format!(
                    "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'pending' ORDER BY priority DESC, enqueued_at ASC LIMIT 1"
                ),
                [],
                Self::row_to_job,
            )
            .optional()
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let Some(mut job) = job else {
            return Ok(None);
        };

        let started_at = Utc::now();
        tx.execute(
            "UPDATE jobs SET status = 'downloading', started_at = ? WHERE id = ?",
            params![started_at.to_rfc3339(), job.id],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        tx.commit().map_err(|e| QueueError::Database(e.to_string()))?;

        job.status = JobStatus::Downloading;
        job.started_at = Some(started_at);
        Ok(Some(job))
    }

    fn get(&self, id: &str) -> Result<Option<QueueJob>, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?"),
            params![id],
            Self::row_to_job,
        )
        .optional()
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn mark_uploading(&self, id: &str) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE jobs SET status = 'uploading' WHERE id = ? AND status = 'downloading'",
                params![id],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(QueueError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn complete(&self, id: &str) -> Result<(), QueueError> {
        self.finish(id, JobStatus::Completed, None, "complete")
    }

    fn fail(&self, id: &str, error: &str) -> Result<(), QueueError> {
        self.finish(id, JobStatus::Failed, Some(error), "fail")
    }

    fn requeue_interrupted(&self) -> Result<usize, QueueError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn
            .execute(
                "UPDATE jobs SET status = 'pending', started_at = NULL WHERE status IN ('downloading', 'uploading')",
                [],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(updated)
    }

    fn counts_by_status(&self) -> Result<QueueCounts, QueueError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status, count))
            })
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let (status, count) = row.map_err(|e| QueueError::Database(e.to_string()))?;
            match status.as_str() {
                "pending" => counts.pending = count,
                "downloading" => counts.downloading = count,
                "uploading" => counts.uploading = count,
                "completed" => counts.completed = count,
                "failed" => counts.failed = count,
                _ => {}
            }
        }
        Ok(counts)
    }

    fn list_by_status(&self, status: JobStatus, limit: u32) -> Result<Vec<QueueJob>, QueueError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM jobs WHERE status = ? ORDER BY enqueued_at DESC LIMIT ?"
            ))
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![status.as_str(), limit], Self::row_to_job)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row.map_err(|e| QueueError::Database(e.to_string()))?);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteQueue {
        SqliteQueue::in_memory().unwrap()
    }

    fn request(series_id: i64, episode: u32, priority: i32) -> EnqueueRequest {
        let mut sources = HashMap::new();
        sources.insert("720p".to_string(), "http://x/ep.mp4".to_string());
        EnqueueRequest {
            series_id,
            series_title: "Example Show".to_string(),
            episode_number: episode,
            sources,
            priority,
        }
    }

    #[test]
    fn test_enqueue_and_get() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.started_at.is_none());

        let fetched = store.get(&job.id).unwrap().unwrap();
        assert_eq!(fetched, job);
    }

    #[test]
    fn test_enqueue_duplicate_refused_while_non_terminal() {
        let store = create_test_store();
        store.enqueue(request(1, 6, 0)).unwrap();

        let result = store.enqueue(request(1, 6, 0));
        assert!(matches!(
            result,
            Err(QueueError::Duplicate {
                series_id: 1,
                episode_number: 6
            })
        ));
    }

    #[test]
    fn test_enqueue_allowed_after_terminal() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();
        store.claim_next().unwrap().unwrap();
        store.fail(&job.id, "network error").unwrap();

        // Previous job is terminal, a fresh one may be queued.
        let second = store.enqueue(request(1, 6, 0)).unwrap();
        assert_ne!(second.id, job.id);
    }

    #[test]
    fn test_claim_next_empty_queue() {
        let store = create_test_store();
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn test_claim_next_marks_downloading() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();

        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
        assert_eq!(claimed.status, JobStatus::Downloading);
        assert!(claimed.started_at.is_some());

        // The claim is exclusive: no second claim for the same job.
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn test_claim_order_priority_then_fifo() {
        let store = create_test_store();
        let low = store.enqueue(request(1, 1, 0)).unwrap();
        let high = store.enqueue(request(1, 2, 10)).unwrap();
        let low2 = store.enqueue(request(1, 3, 0)).unwrap();

        assert_eq!(store.claim_next().unwrap().unwrap().id, high.id);
        assert_eq!(store.claim_next().unwrap().unwrap().id, low.id);
        assert_eq!(store.claim_next().unwrap().unwrap().id, low2.id);
    }

    #[test]
    fn test_claim_is_exclusive_under_concurrency() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let store = Arc::new(create_test_store());
        for episode in 0..20 {
            store.enqueue(request(1, episode, 0)).unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let mut claimed = Vec::new();
                while let Some(job) = store.claim_next().unwrap() {
                    claimed.push(job.id);
                }
                claimed
            }));
        }

        let mut all: Vec<String> = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }

        // Every job claimed exactly once across all workers.
        assert_eq!(all.len(), 20);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_complete_job() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();
        store.claim_next().unwrap();
        store.complete(&job.id).unwrap();

        let fetched = store.get(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
        assert!(fetched.completed_at.is_some());
    }

    #[test]
    fn test_fail_records_error_and_retry() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();
        store.claim_next().unwrap();
        store.fail(&job.id, "no qualities downloaded").unwrap();

        let fetched = store.get(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert_eq!(fetched.retries, 1);
        assert_eq!(
            fetched.error_message.as_deref(),
            Some("no qualities downloaded")
        );
    }

    #[test]
    fn test_terminal_status_is_monotonic() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();
        store.claim_next().unwrap();
        store.complete(&job.id).unwrap();

        // No transition out of a terminal status.
        let result = store.fail(&job.id, "oops");
        assert!(matches!(result, Err(QueueError::InvalidState { .. })));
        let result = store.complete(&job.id);
        assert!(matches!(result, Err(QueueError::InvalidState { .. })));

        let fetched = store.get(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Completed);
    }

    #[test]
    fn test_finish_unknown_job() {
        let store = create_test_store();
        assert!(matches!(
            store.complete("nope"),
            Err(QueueError::NotFound(_))
        ));
    }

    #[test]
    fn test_mark_uploading() {
        let store = create_test_store();
        let job = store.enqueue(request(1, 6, 0)).unwrap();
        store.claim_next().unwrap();
        store.mark_uploading(&job.id).unwrap();

        let fetched = store.get(&job.id).unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Uploading);
    }

    #[test]
    fn test_requeue_interrupted() {
        let store = create_test_store();
        let a = store.enqueue(request(1, 1, 0)).unwrap();
        let b = store.enqueue(request(1, 2, 0)).unwrap();
        store.claim_next().unwrap();
        store.claim_next().unwrap();
        store.mark_uploading(&b.id).unwrap();

        let requeued = store.requeue_interrupted().unwrap();
        assert_eq!(requeued, 2);

        assert_eq!(store.get(&a.id).unwrap().unwrap().status, JobStatus::Pending);
        assert_eq!(store.get(&b.id).unwrap().unwrap().status, JobStatus::Pending);
        assert!(store.get(&a.id).unwrap().unwrap().started_at.is_none());
    }

    #[test]
    fn test_counts_by_status() {
        let store = create_test_store();
        store.enqueue(request(1, 1, 0)).unwrap();
        store.enqueue(request(1, 2, 0)).unwrap();
        let claimed = store.claim_next().unwrap().unwrap();
        store.complete(&claimed.id).unwrap();

        let counts = store.counts_by_status().unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_list_by_status() {
        let store = create_test_store();
        store.enqueue(request(1, 1, 0)).unwrap();
        store.enqueue(request(2, 1, 0)).unwrap();

        let pending = store.list_by_status(JobStatus::Pending, 10).unwrap();
        assert_eq!(pending.len(), 2);
        let failed = store.list_by_status(JobStatus::Failed, 10).unwrap();
        assert!(failed.is_empty());
    }
}
