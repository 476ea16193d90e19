use std::sync::Arc;

use crate::{
    config::Config,
    engine::{ActivityFeed, ContentService, Moderation, RelationshipGraph, UserDirectory},
    store::{EntityStore, SqliteStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserDirectory,
    pub graph: RelationshipGraph,
    pub moderation: Moderation,
    pub feed: ActivityFeed,
    pub content: ContentService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = SqliteStore::new(&config.database.url).await?;
        store.init().await?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Assemble the engine set over any store implementation. Tests use
    /// this with the in-memory store.
    pub fn with_store(store: Arc<dyn EntityStore>, config: Config) -> Self {
        let feed = ActivityFeed::new(store.clone());
        Self {
            users: UserDirectory::new(store.clone()),
            graph: RelationshipGraph::new(store.clone(), feed.clone()),
            moderation: Moderation::new(store.clone(), feed.clone()),
            content: ContentService::new(store, feed.clone()),
            feed,
            config,
        }
    }
}
