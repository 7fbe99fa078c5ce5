use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::resolver::{EpisodeDescriptor, ResolverError, SourceResolver};

/// Scriptable in-memory source resolver.
///
/// `episode_sources` answers only for ids configured with
/// `set_sources`; anything else gets `NoSources`, which is how a real
/// provider behaves for an episode it cannot serve.
#[derive(Default)]
pub struct MockSourceResolver {
    episodes: RwLock<Vec<EpisodeDescriptor>>,
    sources: RwLock<HashMap<String, HashMap<String, String>>>,
    recent: RwLock<Vec<(String, EpisodeDescriptor)>>,
    searched_titles: RwLock<Vec<String>>,
}

impl MockSourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_episodes(&self, episodes: Vec<EpisodeDescriptor>) {
        *self.episodes.write().unwrap() = episodes;
    }

    pub fn set_sources(&self, episode_id: &str, sources: HashMap<String, String>) {
        self.sources
            .write()
            .unwrap()
            .insert(episode_id.to_string(), sources);
    }

    pub fn set_recent(&self, recent: Vec<(String, EpisodeDescriptor)>) {
        *self.recent.write().unwrap() = recent;
    }

    pub fn searched_titles(&self) -> Vec<String> {
        self.searched_titles.read().unwrap().clone()
    }
}

#[async_trait]
impl SourceResolver for MockSourceResolver {
    async fn search_episodes(
        &self,
        title: &str,
    ) -> Result<Vec<EpisodeDescriptor>, ResolverError> {
        self.searched_titles.write().unwrap().push(title.to_string());
        Ok(self.episodes.read().unwrap().clone())
    }

    async fn recent_episodes(&self) -> Result<Vec<(String, EpisodeDescriptor)>, ResolverError> {
        Ok(self.recent.read().unwrap().clone())
    }

    async fn episode_sources(
        &self,
        episode_id: &str,
    ) -> Result<HashMap<String, String>, ResolverError> {
        self.sources
            .read()
            .unwrap()
            .get(episode_id)
            .cloned()
            .ok_or_else(|| ResolverError::NoSources(episode_id.to_string()))
    }
}
