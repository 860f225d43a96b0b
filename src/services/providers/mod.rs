//! Movie data provider abstraction
//!
//! A provider answers paged title searches and per-title detail lookups.
//! Implementations are expected to route their upstream calls through the
//! query cache so repeated and concurrent requests stay cheap.
use crate::{
    error::AppResult,
    models::{MovieDetail, ResultPage, SearchQuery},
};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Whether a cached response (or cached failure) may answer the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    CacheFirst,
    /// Discard the cached entry first; used for explicit user retries
    Refresh,
}

/// Trait for movie data providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Fetches one page (1-based) of title search results
    ///
    /// A search the upstream reports as unsuccessful (e.g. "Movie not found!")
    /// is returned as a page with `success == false`, not as an error.
    async fn search_page(
        &self,
        query: &SearchQuery,
        page: u32,
        policy: FetchPolicy,
    ) -> AppResult<ResultPage>;

    /// Fetches the full record for one title id
    async fn fetch_detail(&self, id: &str) -> AppResult<MovieDetail>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
