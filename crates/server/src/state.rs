use std::sync::Arc;

use animebot_core::catalog::CatalogStore;
use animebot_core::metadata::MetadataClient;
use animebot_core::queue::QueueStore;
use animebot_core::stats::StatsStore;
use animebot_core::{Config, Orchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn QueueStore>,
    stats: Arc<dyn StatsStore>,
    metadata: Arc<dyn MetadataClient>,
    orchestrator: Option<Arc<Orchestrator>>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogStore>,
        queue: Arc<dyn QueueStore>,
        stats: Arc<dyn StatsStore>,
        metadata: Arc<dyn MetadataClient>,
        orchestrator: Option<Arc<Orchestrator>>,
    ) -> Self {
        Self {
            config,
            catalog,
            queue,
            stats,
            metadata,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        self.config.sanitized()
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    pub fn queue(&self) -> &Arc<dyn QueueStore> {
        &self.queue
    }

    pub fn stats(&self) -> &Arc<dyn StatsStore> {
        &self.stats
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataClient> {
        &self.metadata
    }

    pub fn orchestrator(&self) -> Option<&Arc<Orchestrator>> {
        self.orchestrator.as_ref()
    }
}
