use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::metadata::{MetadataClient, MetadataError, SeriesInfo, SeriesSearchResult};

/// Scriptable in-memory metadata client.
#[derive(Default)]
pub struct MockMetadataClient {
    series: RwLock<HashMap<i64, SeriesInfo>>,
    search_results: RwLock<Vec<SeriesSearchResult>>,
    queried_ids: RwLock<Vec<i64>>,
}

impl MockMetadataClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `get_series` answer for this series' id.
    pub fn set_series(&self, info: SeriesInfo) {
        self.series.write().unwrap().insert(info.id, info);
    }

    pub fn set_search_results(&self, results: Vec<SeriesSearchResult>) {
        *self.search_results.write().unwrap() = results;
    }

    /// Ids `get_series` was called with, in order.
    pub fn queried_ids(&self) -> Vec<i64> {
        self.queried_ids.read().unwrap().clone()
    }
}

#[async_trait]
impl MetadataClient for MockMetadataClient {
    async fn search(&self, _query: &str) -> Result<Vec<SeriesSearchResult>, MetadataError> {
        Ok(self.search_results.read().unwrap().clone())
    }

    async fn get_series(&self, id: i64) -> Result<SeriesInfo, MetadataError> {
        self.queried_ids.write().unwrap().push(id);
        self.series
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(format!("Series ID {}", id)))
    }
}
