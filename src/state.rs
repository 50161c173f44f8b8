use std::sync::Arc;

use crate::{
    config::Config, db::DocumentStore, ingestion::Embedder, llm::TextGenerator,
    storage::BlobStore, views::Views,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn TextGenerator>,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        views: Views,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            blobs,
            embedder,
            generator,
            views: Arc::new(views),
        }
    }
}
