//! Catalog of tracked series and their detected episodes.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteCatalog;
pub use store::{AddSeriesRequest, CatalogError, CatalogStore};
pub use types::{EpisodeRecord, EpisodeStatus, SeriesStatus, TrackedSeries};
