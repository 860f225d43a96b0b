//! Infinite pagination over a stateless "fetch page N" endpoint
//!
//! `PaginatedSearch` accumulates pages for one query and decides whether
//! another page may be requested. Requests are split into `begin_next` and
//! `complete` so callers can release their locks while the page is fetched;
//! every request carries the generation it was issued in, and completions
//! from an older generation (the query changed meanwhile) are dropped.

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieSummary, ResultPage, SearchQuery},
};

/// Source of result pages, keyed by query and 1-based page number
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<ResultPage>;
}

/// A page request issued by `PaginatedSearch::begin_next`
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub generation: u64,
    pub query: SearchQuery,
    pub page: u32,
    /// The previous attempt for this page failed; bypass any cached failure
    pub retry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// No page requested yet for the current query
    Idle,
    /// First page in flight
    Loading,
    /// A follow-up page in flight
    LoadingMore,
    /// Pages received and more are available
    Loaded,
    /// No further pages will be requested for this query
    Exhausted,
    /// The last request failed; `begin_next` issues a retry
    Failed,
}

#[derive(Debug, Default)]
pub struct PaginatedSearch {
    query: Option<SearchQuery>,
    pages: Vec<ResultPage>,
    generation: u64,
    in_flight: Option<u32>,
    exhausted: bool,
    last_error: Option<AppError>,
}

impl PaginatedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    /// Replaces the query, returning true when accumulated pages were discarded
    ///
    /// Only text, year and search type select pages; a genre-only change keeps
    /// everything fetched so far.
    pub fn set_query(&mut self, query: SearchQuery) -> bool {
        let reset = match &self.query {
            Some(current) => !current.same_pages_as(&query),
            None => true,
        };

        if reset {
            self.reset();
            tracing::debug!(
                query = %query.text,
                search_type = %query.search_type,
                generation = self.generation,
                "Pagination reset"
            );
        }

        self.query = Some(query);
        reset
    }

    fn reset(&mut self) {
        self.pages.clear();
        self.generation += 1;
        self.in_flight = None;
        self.exhausted = false;
        self.last_error = None;
    }

    /// Reserves the next page request, or `None` when one may not be issued
    pub fn begin_next(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.exhausted {
            return None;
        }

        let query = self.query.as_ref()?;
        if query.text.trim().is_empty() {
            return None;
        }

        if !self.pages.is_empty() && !self.has_more() {
            return None;
        }

        let page = self.pages.len() as u32 + 1;
        self.in_flight = Some(page);

        Some(PageRequest {
            generation: self.generation,
            query: query.clone(),
            page,
            retry: self.last_error.is_some(),
        })
    }

    /// Applies the outcome of `request`; returns false if it was stale
    pub fn complete(&mut self, request: &PageRequest, result: AppResult<ResultPage>) -> bool {
        if request.generation != self.generation || self.in_flight != Some(request.page) {
            tracing::debug!(
                page = request.page,
                request_generation = request.generation,
                generation = self.generation,
                "Discarding stale page"
            );
            return false;
        }

        self.in_flight = None;

        match result {
            Ok(mut page) => {
                self.last_error = None;

                if !page.success || page.items.is_empty() {
                    self.exhausted = true;
                }

                if self.pages.is_empty()
                    && page.success
                    && page.total_results == 0
                    && !page.items.is_empty()
                {
                    tracing::warn!(
                        page = request.page,
                        items = page.items.len(),
                        "First page reported no total; counting its items instead"
                    );
                    page.total_results = page.items.len() as u32;
                }

                let total = self
                    .pages
                    .first()
                    .map_or(page.total_results, |first| first.total_results);
                let room = (total as usize).saturating_sub(self.accumulated_len());
                page.items.truncate(room);

                self.pages.push(page);
            }
            Err(e) => {
                tracing::warn!(page = request.page, error = %e, "Page request failed");
                self.last_error = Some(e);
            }
        }

        true
    }

    /// Requests and applies the next page from `source`
    ///
    /// Returns `Ok(false)` when no request was allowed.
    pub async fn fetch_next(&mut self, source: &dyn PageSource) -> AppResult<bool> {
        let Some(request) = self.begin_next() else {
            return Ok(false);
        };

        match source.fetch_page(&request).await {
            Ok(page) => {
                self.complete(&request, Ok(page));
                Ok(true)
            }
            Err(e) => {
                self.complete(&request, Err(e.clone()));
                Err(e)
            }
        }
    }

    /// More pages exist and the last one gave no reason to stop
    pub fn has_more(&self) -> bool {
        let (Some(last), Some(total)) = (self.pages.last(), self.total_results()) else {
            return false;
        };

        !self.exhausted
            && last.success
            && !last.items.is_empty()
            && self.accumulated_len() < total as usize
    }

    /// Total reported by the first page
    pub fn total_results(&self) -> Option<u32> {
        self.pages.first().map(|page| page.total_results)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[ResultPage] {
        &self.pages
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    pub fn accumulated_len(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    /// All received items in page order
    pub fn items(&self) -> impl Iterator<Item = &MovieSummary> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn accumulated(&self) -> Vec<MovieSummary> {
        self.items().cloned().collect()
    }

    /// Message from the most recent unsuccessful page, e.g. "Movie not found!"
    pub fn notice(&self) -> Option<&str> {
        self.pages
            .last()
            .filter(|page| !page.success)
            .and_then(|page| page.error_message.as_deref())
    }

    pub fn state(&self) -> PageState {
        match self.in_flight {
            Some(1) => PageState::Loading,
            Some(_) => PageState::LoadingMore,
            None if self.last_error.is_some() => PageState::Failed,
            None if self.pages.is_empty() => PageState::Idle,
            None if self.has_more() => PageState::Loaded,
            None => PageState::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaType, SearchType};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Replays canned page results in order and records the requests
    struct ScriptedSource {
        results: Mutex<VecDeque<AppResult<ResultPage>>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedSource {
        fn new(results: Vec<AppResult<ResultPage>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, request: &PageRequest) -> AppResult<ResultPage> {
            self.requests.lock().unwrap().push(request.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted page left")
        }
    }

    fn movies(prefix: &str, count: usize) -> Vec<MovieSummary> {
        (0..count)
            .map(|i| MovieSummary {
                id: format!("{}{}", prefix, i),
                title: format!("{} {}", prefix, i),
                year: "2005".to_string(),
                media_type: MediaType::Movie,
                poster_url: "N/A".to_string(),
            })
            .collect()
    }

    fn page(prefix: &str, count: usize, total: u32) -> AppResult<ResultPage> {
        Ok(ResultPage::success(movies(prefix, count), total))
    }

    fn search(text: &str) -> PaginatedSearch {
        let mut search = PaginatedSearch::new();
        search.set_query(SearchQuery::new(text));
        search
    }

    #[tokio::test]
    async fn test_batman_accumulates_to_total() {
        let source = ScriptedSource::new(vec![
            page("a", 10, 23),
            page("b", 10, 23),
            page("c", 3, 23),
        ]);
        let mut search = search("batman");

        assert!(search.fetch_next(&source).await.unwrap());
        assert!(search.has_more());
        assert_eq!(search.state(), PageState::Loaded);

        assert!(search.fetch_next(&source).await.unwrap());
        assert!(search.has_more());

        assert!(search.fetch_next(&source).await.unwrap());
        assert_eq!(search.accumulated_len(), 23);
        assert!(!search.has_more());
        assert_eq!(search.state(), PageState::Exhausted);

        assert!(!search.fetch_next(&source).await.unwrap());

        let pages: Vec<u32> = source.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_accumulated_matches_pages_and_total() {
        let source = ScriptedSource::new(vec![page("a", 10, 15), page("b", 10, 15)]);
        let mut search = search("alien");

        search.fetch_next(&source).await.unwrap();
        search.fetch_next(&source).await.unwrap();

        let page_sum: usize = search.pages().iter().map(|p| p.items.len()).sum();
        assert_eq!(search.accumulated_len(), page_sum);
        assert_eq!(search.accumulated_len(), 15);
        assert!(search.accumulated_len() <= search.total_results().unwrap() as usize);
        assert_eq!(search.accumulated()[14].id, "b4");
    }

    #[tokio::test]
    async fn test_empty_page_exhausts_despite_total() {
        let source = ScriptedSource::new(vec![page("a", 10, 40), page("b", 0, 40)]);
        let mut search = search("heat");

        search.fetch_next(&source).await.unwrap();
        assert!(search.has_more());

        search.fetch_next(&source).await.unwrap();
        assert!(!search.has_more());
        assert_eq!(search.state(), PageState::Exhausted);
        assert_eq!(search.begin_next(), None);
    }

    #[tokio::test]
    async fn test_unsuccessful_page_exhausts() {
        let source = ScriptedSource::new(vec![
            page("a", 10, 40),
            Ok(ResultPage::failure("Too many results.")),
        ]);
        let mut search = search("the");

        search.fetch_next(&source).await.unwrap();
        search.fetch_next(&source).await.unwrap();

        assert!(!search.has_more());
        assert_eq!(search.accumulated_len(), 10);
        assert_eq!(search.notice(), Some("Too many results."));
        assert!(!search.fetch_next(&source).await.unwrap());
    }

    #[tokio::test]
    async fn test_not_found_first_page() {
        let source = ScriptedSource::new(vec![Ok(ResultPage::failure("Movie not found!"))]);
        let mut search = search("zzzzqqq");

        search.fetch_next(&source).await.unwrap();

        assert_eq!(search.state(), PageState::Exhausted);
        assert_eq!(search.accumulated_len(), 0);
        assert_eq!(search.notice(), Some("Movie not found!"));
    }

    #[tokio::test]
    async fn test_first_page_without_total_keeps_items() {
        let source = ScriptedSource::new(vec![page("a", 7, 0)]);
        let mut search = search("heat");

        assert_ok!(search.fetch_next(&source).await);

        assert_eq!(search.accumulated_len(), 7);
        assert_eq!(search.total_results(), Some(7));
        assert!(!search.has_more());
        assert_eq!(search.state(), PageState::Exhausted);
    }

    #[tokio::test]
    async fn test_overlong_page_is_truncated_to_total() {
        let source = ScriptedSource::new(vec![page("a", 10, 12), page("b", 10, 30)]);
        let mut search = search("heat");

        search.fetch_next(&source).await.unwrap();
        search.fetch_next(&source).await.unwrap();

        assert_eq!(search.accumulated_len(), 12);
        assert!(!search.has_more());
    }

    #[tokio::test]
    async fn test_text_change_resets() {
        let source = ScriptedSource::new(vec![page("a", 10, 30), page("b", 10, 30)]);
        let mut search = search("batman");
        search.fetch_next(&source).await.unwrap();
        search.fetch_next(&source).await.unwrap();
        assert_eq!(search.page_count(), 2);

        assert!(search.set_query(SearchQuery::new("superman")));
        assert_eq!(search.accumulated_len(), 0);
        assert_eq!(search.page_count(), 0);
        assert_eq!(search.state(), PageState::Idle);

        let next = search.begin_next().unwrap();
        assert_eq!(next.page, 1);
        assert_eq!(next.query.text, "superman");
    }

    #[tokio::test]
    async fn test_year_and_type_changes_reset() {
        let source = ScriptedSource::new(vec![page("a", 10, 30)]);
        let mut search = search("batman");
        search.fetch_next(&source).await.unwrap();

        assert!(search.set_query(SearchQuery::new("batman").with_year("1989")));
        assert_eq!(search.page_count(), 0);

        assert!(search.set_query(
            SearchQuery::new("batman")
                .with_year("1989")
                .with_search_type(SearchType::Both)
        ));
    }

    #[tokio::test]
    async fn test_genre_change_keeps_pages() {
        let source = ScriptedSource::new(vec![page("a", 10, 30)]);
        let mut search = search("batman");
        search.fetch_next(&source).await.unwrap();
        let generation = search.generation();

        assert!(!search.set_query(SearchQuery::new("batman").with_genre("Action")));
        assert_eq!(search.accumulated_len(), 10);
        assert_eq!(search.generation(), generation);
        assert_eq!(search.query().unwrap().genre, "Action");
    }

    #[test]
    fn test_no_second_request_while_loading() {
        let mut search = search("batman");
        let first = search.begin_next().unwrap();

        assert_eq!(search.state(), PageState::Loading);
        assert_eq!(search.begin_next(), None);

        assert!(search.complete(&first, page("a", 10, 30)));
        let second = search.begin_next().unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(search.state(), PageState::LoadingMore);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut search = search("batman");
        let stale = search.begin_next().unwrap();

        search.set_query(SearchQuery::new("superman"));
        let fresh = search.begin_next().unwrap();

        assert!(!search.complete(&stale, page("bat", 10, 30)));
        assert!(search.is_loading());

        assert!(search.complete(&fresh, page("super", 10, 30)));
        assert_eq!(search.accumulated()[0].id, "super0");
    }

    #[test]
    fn test_empty_text_issues_nothing() {
        let mut search = search("   ");
        assert_eq!(search.begin_next(), None);

        let mut fresh = PaginatedSearch::new();
        assert_eq!(fresh.begin_next(), None);
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let source = ScriptedSource::new(vec![
            page("a", 10, 30),
            Err(AppError::HttpClient("connection reset".to_string())),
            page("b", 10, 30),
        ]);
        let mut search = search("batman");

        assert_ok!(search.fetch_next(&source).await);
        let err = assert_err!(search.fetch_next(&source).await);
        assert_eq!(err, AppError::HttpClient("connection reset".to_string()));
        assert_eq!(search.state(), PageState::Failed);
        assert_eq!(search.accumulated_len(), 10);

        assert!(search.fetch_next(&source).await.unwrap());
        assert_eq!(search.accumulated_len(), 20);
        assert!(search.last_error().is_none());

        let requests = source.requests();
        assert_eq!(requests[1].page, 2);
        assert!(!requests[1].retry);
        assert_eq!(requests[2].page, 2);
        assert!(requests[2].retry);
    }
}
