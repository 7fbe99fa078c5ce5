//! SQLite-backed counter store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::store::{COUNTER_DOWNLOADS, COUNTER_UPLOADS};
use super::{GlobalStats, StatsError, StatsStore};

pub struct SqliteStats {
    conn: Mutex<Connection>,
}

impl SqliteStats {
    pub fn new(path: &Path) -> Result<Self, StatsError> {
        let conn = Connection::open(path).map_err(|e| StatsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, StatsError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StatsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StatsError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StatsError::Database(e.to_string()))?;
        Ok(())
    }

    fn read_counter(conn: &Connection, name: &str) -> Result<i64, StatsError> {
        conn.query_row(
            "SELECT value FROM counters WHERE name = ?",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StatsError::Database(e.to_string()))
        .map(|v| v.unwrap_or(0))
    }
}

impl StatsStore for SqliteStats {
    fn increment(&self, name: &str, delta: i64) -> Result<(), StatsError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO counters (name, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET value = value + excluded.value, updated_at = excluded.updated_at",
            params![name, delta, Utc::now().to_rfc3339()],
        )
        .map_err(|e| StatsError::Database(e.to_string()))?;
        Ok(())
    }

    fn get(&self) -> Result<GlobalStats, StatsError> {
        let conn = self.conn.lock().unwrap();
        let total_downloads = Self::read_counter(&conn, COUNTER_DOWNLOADS)?;
        let total_uploads = Self::read_counter(&conn, COUNTER_UPLOADS)?;

        let last_updated: Option<String> = conn
            .query_row("SELECT MAX(updated_at) FROM counters", [], |row| row.get(0))
            .optional()
            .map_err(|e| StatsError::Database(e.to_string()))?
            .flatten();

        Ok(GlobalStats {
            total_downloads,
            total_uploads,
            last_updated: last_updated.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
    }
}
