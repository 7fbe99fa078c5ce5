//! SQLite-backed catalog implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    AddSeriesRequest, CatalogError, CatalogStore, EpisodeRecord, EpisodeStatus, SeriesStatus,
    TrackedSeries,
};

/// SQLite-backed catalog store.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) the catalog at the given path.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS series (
                series_id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                total_episodes INTEGER,
                status TEXT NOT NULL,
                cover_image TEXT NOT NULL DEFAULT '',
                latest_episode INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                added_at TEXT NOT NULL,
                last_checked TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS episodes (
                series_id INTEGER NOT NULL,
                episode_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                sources TEXT NOT NULL,
                status TEXT NOT NULL,
                retries INTEGER NOT NULL DEFAULT 0,
                added_at TEXT NOT NULL,
                PRIMARY KEY (series_id, episode_number)
            );

            CREATE INDEX IF NOT EXISTS idx_series_active ON series(active);
            CREATE INDEX IF NOT EXISTS idx_episodes_status ON episodes(status);
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_series(row: &rusqlite::Row) -> rusqlite::Result<TrackedSeries> {
        let series_id: i64 = row.get(0)?;
        let title: String = row.get(1)?;
        let total_episodes: Option<u32> = row.get(2)?;
        let status_str: String = row.get(3)?;
        let cover_image: String = row.get(4)?;
        let latest_episode: u32 = row.get(5)?;
        let active: bool = row.get(6)?;
        let added_at_str: String = row.get(7)?;
        let last_checked_str: String = row.get(8)?;

        let status = match status_str.as_str() {
            "concluded" => SeriesStatus::Concluded,
            _ => SeriesStatus::Ongoing,
        };

        Ok(TrackedSeries {
            series_id,
            title,
            total_episodes,
            status,
            cover_image,
            latest_episode,
            active,
            added_at: parse_timestamp(&added_at_str),
            last_checked: parse_timestamp(&last_checked_str),
        })
    }

    fn row_to_episode(row: &rusqlite::Row) -> rusqlite::Result<EpisodeRecord> {
        let series_id: i64 = row.get(0)?;
        let episode_number: u32 = row.get(1)?;
        let title: String = row.get(2)?;
        let sources_json: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let retries: u32 = row.get(5)?;
        let added_at_str: String = row.get(6)?;

        let sources: HashMap<String, String> =
            serde_json::from_str(&sources_json).unwrap_or_default();

        let status = match status_str.as_str() {
            "downloaded" => EpisodeStatus::Downloaded,
            "published" => EpisodeStatus::Published,
            "failed" => EpisodeStatus::Failed,
            _ => EpisodeStatus::Pending,
        };

        Ok(EpisodeRecord {
            series_id,
            episode_number,
            title,
            sources,
            status,
            retries,
            added_at: parse_timestamp(&added_at_str),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl CatalogStore for SqliteCatalog {
    fn add_series(&self, request: AddSeriesRequest) -> Result<TrackedSeries, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO series (series_id, title, total_episodes, status, cover_image, latest_episode, active, added_at, last_checked) VALUES (?, ?, ?, ?, ?, 0, 1, ?, ?)",
            params![
                request.series_id,
                request.title,
                request.total_episodes,
                request.status.as_str(),
                request.cover_image,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(TrackedSeries {
                series_id: request.series_id,
                title: request.title,
                total_episodes: request.total_episodes,
                status: request.status,
                cover_image: request.cover_image,
                latest_episode: 0,
                active: true,
                added_at: now,
                last_checked: now,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(CatalogError::DuplicateSeries(request.series_id))
            }
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }

    fn remove_series(&self, series_id: i64) -> Result<TrackedSeries, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let series = conn
            .query_row(
                "SELECT series_id, title, total_episodes, status, cover_image, latest_episode, active, added_at, last_checked FROM series WHERE series_id = ?",
                params![series_id],
                Self::row_to_series,
            )
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?
            .ok_or(CatalogError::SeriesNotFound(series_id))?;

        conn.execute("DELETE FROM series WHERE series_id = ?", params![series_id])
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        Ok(series)
    }

    fn get_series(&self, series_id: i64) -> Result<Option<TrackedSeries>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT series_id, title, total_episodes, status, cover_image, latest_episode, active, added_at, last_checked FROM series WHERE series_id = ?",
            params![series_id],
            Self::row_to_series,
        )
        .optional()
        .map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn list_series(&self, active_only: bool) -> Result<Vec<TrackedSeries>, CatalogError> {
        let conn = self.conn.lock().unwrap();

        let sql = if active_only {
            "SELECT series_id, title, total_episodes, status, cover_image, latest_episode, active, added_at, last_checked FROM series WHERE active = 1 ORDER BY added_at ASC"
        } else {
            "SELECT series_id, title, total_episodes, status, cover_image, latest_episode, active, added_at, last_checked FROM series ORDER BY added_at ASC"
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_series)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut series = Vec::new();
        for row in rows {
            series.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }
        Ok(series)
    }

    fn update_latest_episode(
        &self,
        series_id: i64,
        episode_number: u32,
    ) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        // MAX() keeps the counter monotone even if callers race.
        let updated = conn
            .execute(
                "UPDATE series SET latest_episode = MAX(latest_episode, ?), last_checked = ? WHERE series_id = ?",
                params![episode_number, Utc::now().to_rfc3339(), series_id],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        if updated == 0 {
            return Err(CatalogError::SeriesNotFound(series_id));
        }
        Ok(())
    }

    fn touch_series(&self, series_id: i64, at: DateTime<Utc>) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE series SET last_checked = ? WHERE series_id = ?",
            params![at.to_rfc3339(), series_id],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(())
    }

    fn insert_episode(&self, record: &EpisodeRecord) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();

        let sources_json = serde_json::to_string(&record.sources)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let result = conn.execute(
            "INSERT INTO episodes (series_id, episode_number, title, sources, status, retries, added_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                record.series_id,
                record.episode_number,
                record.title,
                sources_json,
                record.status.as_str(),
                record.retries,
                record.added_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(CatalogError::DuplicateEpisode {
                series_id: record.series_id,
                episode_number: record.episode_number,
            }),
            Err(e) => Err(CatalogError::Database(e.to_string())),
        }
    }

    fn episode_exists(&self, series_id: i64, episode_number: u32) -> Result<bool, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM episodes WHERE series_id = ? AND episode_number = ?",
                params![series_id, episode_number],
                |row| row.get(0),
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    fn get_episode(
        &self,
        series_id: i64,
        episode_number: u32,
    ) -> Result<Option<EpisodeRecord>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT series_id, episode_number, title, sources, status, retries, added_at FROM episodes WHERE series_id = ? AND episode_number = ?",
            params![series_id, episode_number],
            Self::row_to_episode,
        )
        .optional()
        .map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn set_episode_status(
        &self,
        series_id: i64,
        episode_number: u32,
        status: EpisodeStatus,
    ) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE episodes SET status = ? WHERE series_id = ? AND episode_number = ?",
            params![status.as_str(), series_id, episode_number],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;
        Ok(())
    }

    fn count_series(&self) -> Result<i64, CatalogError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM series WHERE active = 1", [], |row| {
            row.get(0)
        })
        .map_err(|e| CatalogError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteCatalog {
        SqliteCatalog::in_memory().unwrap()
    }

    fn add_request(series_id: i64, title: &str) -> AddSeriesRequest {
        AddSeriesRequest {
            series_id,
            title: title.to_string(),
            total_episodes: Some(12),
            status: SeriesStatus::Ongoing,
            cover_image: String::new(),
        }
    }

    fn episode(series_id: i64, number: u32) -> EpisodeRecord {
        let mut sources = HashMap::new();
        sources.insert("720p".to_string(), "http://x/ep.mp4".to_string());
        EpisodeRecord {
            series_id,
            episode_number: number,
            title: format!("Episode {}", number),
            sources,
            status: EpisodeStatus::Pending,
            retries: 0,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_and_get_series() {
        let store = create_test_store();
        let series = store.add_series(add_request(1, "Example Show")).unwrap();
        assert_eq!(series.latest_episode, 0);
        assert!(series.active);

        let fetched = store.get_series(1).unwrap().unwrap();
        assert_eq!(fetched.title, "Example Show");
    }

    #[test]
    fn test_add_duplicate_series_refused() {
        let store = create_test_store();
        store.add_series(add_request(1, "Example Show")).unwrap();
        let result = store.add_series(add_request(1, "Example Show"));
        assert!(matches!(result, Err(CatalogError::DuplicateSeries(1))));
    }

    #[test]
    fn test_remove_series() {
        let store = create_test_store();
        store.add_series(add_request(1, "Example Show")).unwrap();
        let removed = store.remove_series(1).unwrap();
        assert_eq!(removed.series_id, 1);
        assert!(store.get_series(1).unwrap().is_none());
    }

    #[test]
    fn test_remove_unknown_series() {
        let store = create_test_store();
        let result = store.remove_series(99);
        assert!(matches!(result, Err(CatalogError::SeriesNotFound(99))));
    }

    #[test]
    fn test_list_active_only() {
        let store = create_test_store();
        store.add_series(add_request(1, "A")).unwrap();
        store.add_series(add_request(2, "B")).unwrap();
        assert_eq!(store.list_series(true).unwrap().len(), 2);
        assert_eq!(store.count_series().unwrap(), 2);
    }

    #[test]
    fn test_update_latest_episode_is_monotone() {
        let store = create_test_store();
        store.add_series(add_request(1, "A")).unwrap();

        store.update_latest_episode(1, 6).unwrap();
        assert_eq!(store.get_series(1).unwrap().unwrap().latest_episode, 6);

        // A lower number does not move the counter back.
        store.update_latest_episode(1, 3).unwrap();
        assert_eq!(store.get_series(1).unwrap().unwrap().latest_episode, 6);
    }

    #[test]
    fn test_update_latest_episode_unknown_series() {
        let store = create_test_store();
        let result = store.update_latest_episode(99, 1);
        assert!(matches!(result, Err(CatalogError::SeriesNotFound(99))));
    }

    #[test]
    fn test_insert_episode_and_exists() {
        let store = create_test_store();
        store.add_series(add_request(1, "A")).unwrap();

        assert!(!store.episode_exists(1, 6).unwrap());
        store.insert_episode(&episode(1, 6)).unwrap();
        assert!(store.episode_exists(1, 6).unwrap());

        let fetched = store.get_episode(1, 6).unwrap().unwrap();
        assert_eq!(fetched.sources.get("720p").unwrap(), "http://x/ep.mp4");
    }

    #[test]
    fn test_duplicate_episode_refused() {
        let store = create_test_store();
        store.insert_episode(&episode(1, 6)).unwrap();
        let result = store.insert_episode(&episode(1, 6));
        assert!(matches!(
            result,
            Err(CatalogError::DuplicateEpisode {
                series_id: 1,
                episode_number: 6
            })
        ));
    }

    #[test]
    fn test_same_number_different_series_allowed() {
        let store = create_test_store();
        store.insert_episode(&episode(1, 6)).unwrap();
        store.insert_episode(&episode(2, 6)).unwrap();
        assert!(store.episode_exists(1, 6).unwrap());
        assert!(store.episode_exists(2, 6).unwrap());
    }

    #[test]
    fn test_set_episode_status() {
        let store = create_test_store();
        store.insert_episode(&episode(1, 6)).unwrap();
        store
            .set_episode_status(1, 6, EpisodeStatus::Published)
            .unwrap();
        let fetched = store.get_episode(1, 6).unwrap().unwrap();
        assert_eq!(fetched.status, EpisodeStatus::Published);
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        let store = SqliteCatalog::new(&db_path).unwrap();
        store.add_series(add_request(1, "Example Show")).unwrap();

        assert!(db_path.exists());
        assert!(store.get_series(1).unwrap().is_some());
    }
}
