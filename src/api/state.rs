use std::sync::Arc;

use crate::services::{
    ActorDirectory, DiscoveryService, LibraryStore, MovieProvider,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub discovery: DiscoveryService,
    pub provider: Arc<dyn MovieProvider>,
    pub actors: Arc<ActorDirectory>,
    pub library: Arc<LibraryStore>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn MovieProvider>,
        actors: Arc<ActorDirectory>,
        library: LibraryStore,
        genre_batch_size: usize,
    ) -> Self {
        Self {
            discovery: DiscoveryService::new(
                Arc::clone(&provider),
                Arc::clone(&actors),
                genre_batch_size,
            ),
            provider,
            actors,
            library: Arc::new(library),
        }
    }
}
