//! Persistent global counters (downloads, uploads).

mod sqlite;
mod store;

pub use sqlite::SqliteStats;
pub use store::{GlobalStats, StatsError, StatsStore, COUNTER_DOWNLOADS, COUNTER_UPLOADS};
