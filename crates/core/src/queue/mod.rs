//! Durable acquisition work queue with atomic claim semantics.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteQueue;
pub use store::{QueueError, QueueStore};
pub use types::{EnqueueRequest, JobStatus, QueueCounts, QueueJob};
