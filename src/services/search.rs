use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{ResultPage, SearchType},
    services::{
        actors::ActorDirectory,
        pagination::{PageRequest, PageSource},
        providers::{FetchPolicy, MovieProvider},
    },
};

/// Routes page requests to the data source matching the search type
///
/// Actor searches page through the actor directory's placeholder
/// filmographies; title and combined searches go to the movie provider.
#[derive(Clone)]
pub struct CatalogSearch {
    provider: Arc<dyn MovieProvider>,
    actors: Arc<ActorDirectory>,
}

impl CatalogSearch {
    pub fn new(provider: Arc<dyn MovieProvider>, actors: Arc<ActorDirectory>) -> Self {
        Self { provider, actors }
    }
}

#[async_trait::async_trait]
impl PageSource for CatalogSearch {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<ResultPage> {
        match request.query.search_type {
            SearchType::Actor => Ok(self.actors.paginated(&request.query.text, request.page)),
            SearchType::Movie | SearchType::Both => {
                let policy = if request.retry {
                    FetchPolicy::Refresh
                } else {
                    FetchPolicy::CacheFirst
                };
                self.provider
                    .search_page(&request.query, request.page, policy)
                    .await
            }
        }
    }
}
