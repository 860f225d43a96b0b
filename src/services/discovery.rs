//! Browsing sessions
//!
//! A session ties one accumulating search to one genre filter. The session
//! map is only locked to read or advance session state; page and detail
//! fetches run with the lock released and publish through the generation
//! tickets of `PaginatedSearch` and `GenreFilter`, so a query edited while a
//! request is in flight never receives the old request's results.
//!
//! Every operation that issues a ticket runs on its own task. A caller that
//! stops waiting (a dropped HTTP handler) cannot leave a ticket unanswered.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ActorRecord, MovieSummary, SearchQuery, SearchType, ALL_GENRES},
    services::{
        actors::ActorDirectory,
        genre_filter::{filter_by_genre, GenreFilter},
        pagination::{PageRequest, PageSource, PageState, PaginatedSearch},
        providers::MovieProvider,
        search::CatalogSearch,
    },
};

struct BrowseSession {
    search: PaginatedSearch,
    filter: GenreFilter,
    actor_matches: Vec<ActorRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Monotonic twin of `updated_at`, used for idle eviction
    last_active: Instant,
}

impl BrowseSession {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            search: PaginatedSearch::new(),
            filter: GenreFilter::new(),
            actor_matches: Vec::new(),
            created_at: now,
            updated_at: now,
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.last_active = Instant::now();
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub query: Option<SearchQuery>,
    pub state: PageState,
    pub items: Vec<MovieSummary>,
    pub filtered: Vec<MovieSummary>,
    pub total_results: Option<u32>,
    pub page_count: usize,
    pub has_more: bool,
    pub is_filtering: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub actor_matches: Vec<ActorRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DiscoveryService {
    provider: Arc<dyn MovieProvider>,
    actors: Arc<ActorDirectory>,
    search: CatalogSearch,
    sessions: Arc<RwLock<HashMap<Uuid, BrowseSession>>>,
    batch_size: usize,
}

/// Handle for gracefully shutting down the idle session reaper
pub struct SessionReaperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SessionReaperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Session reaper task failed");
        }
        tracing::info!("Session reaper stopped");
    }
}

impl DiscoveryService {
    pub fn new(
        provider: Arc<dyn MovieProvider>,
        actors: Arc<ActorDirectory>,
        batch_size: usize,
    ) -> Self {
        Self {
            search: CatalogSearch::new(Arc::clone(&provider), Arc::clone(&actors)),
            provider,
            actors,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            batch_size,
        }
    }

    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, BrowseSession::new());
        tracing::info!(session = %id, "Session created");
        id
    }

    pub async fn remove_session(&self, id: Uuid) -> AppResult<()> {
        if self.sessions.write().await.remove(&id).is_none() {
            return Err(session_not_found(id));
        }

        tracing::info!(session = %id, "Session removed");
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions without query, paging or retry activity for `max_idle`
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = now.saturating_duration_since(session.last_active) < max_idle;
            if !keep {
                tracing::debug!(session = %id, "Evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Spawns a background task evicting idle sessions every `interval`
    pub fn start_reaper(&self, interval: Duration, max_idle: Duration) -> SessionReaperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let service = self.clone();

        let task = tokio::spawn(async move {
            tracing::info!(
                interval_secs = interval.as_secs(),
                max_idle_secs = max_idle.as_secs(),
                "Session reaper started"
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = service.evict_idle(max_idle).await;
                        if removed > 0 {
                            tracing::info!(removed, "Evicted idle sessions");
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        SessionReaperHandle { shutdown_tx, task }
    }

    /// Applies a new query
    ///
    /// A change of text, year or search type drops the accumulated pages and
    /// loads page one; a genre-only change just re-filters what is there.
    pub async fn update_query(&self, id: Uuid, query: SearchQuery) -> AppResult<SessionSnapshot> {
        self.detached(move |service| async move { service.apply_query(id, query).await })
            .await
    }

    /// Loads the next page when one may be requested, then re-filters
    pub async fn load_more(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        self.detached(move |service| async move { service.next_page(id).await })
            .await
    }

    /// Re-issues the page request that failed last, bypassing its cached error
    pub async fn retry(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        self.detached(move |service| async move { service.retry_page(id).await })
            .await
    }

    pub async fn snapshot(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
        let search = &session.search;

        Ok(SessionSnapshot {
            id,
            query: search.query().cloned(),
            state: search.state(),
            items: search.accumulated(),
            filtered: session.filter.filtered().to_vec(),
            total_results: search.total_results(),
            page_count: search.page_count(),
            has_more: search.has_more(),
            is_filtering: session.filter.is_filtering(),
            notice: search.notice().map(str::to_string),
            error: search.last_error().map(ToString::to_string),
            actor_matches: session.actor_matches.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        })
    }

    /// Runs `op` to completion on its own task and waits for it
    async fn detached<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: FnOnce(DiscoveryService) -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(op(self.clone()))
            .await
            .map_err(|e| AppError::Internal(format!("Session task failed: {}", e)))?
    }

    async fn apply_query(&self, id: Uuid, query: SearchQuery) -> AppResult<SessionSnapshot> {
        let request = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
            session.touch();

            let reset = session.search.set_query(query.clone());
            if reset {
                session.actor_matches = match query.search_type {
                    SearchType::Actor | SearchType::Both if !query.text.trim().is_empty() => {
                        self.actors.search_by_name_or_movie(&query.text)
                    }
                    _ => Vec::new(),
                };
                session.search.begin_next()
            } else {
                None
            }
        };

        if let Some(request) = request {
            self.run_page(id, request).await;
        }

        self.refilter(id).await?;
        self.snapshot(id).await
    }

    async fn next_page(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let request = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
            session.touch();
            session.search.begin_next()
        };

        match request {
            Some(request) => {
                self.run_page(id, request).await;
                self.refilter(id).await?;
            }
            None => tracing::debug!(session = %id, "No further page to load"),
        }

        self.snapshot(id).await
    }

    async fn retry_page(&self, id: Uuid) -> AppResult<SessionSnapshot> {
        let request = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
            if session.search.last_error().is_none() {
                return Err(AppError::InvalidInput(
                    "The session has no failed request to retry".to_string(),
                ));
            }
            session.touch();
            session.search.begin_next()
        };

        if let Some(request) = request {
            tracing::info!(session = %id, page = request.page, "Retrying page");
            self.run_page(id, request).await;
            self.refilter(id).await?;
        }

        self.snapshot(id).await
    }

    async fn run_page(&self, id: Uuid, request: PageRequest) {
        let result = self.search.fetch_page(&request).await;

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(session) => {
                session.search.complete(&request, result);
            }
            None => tracing::debug!(session = %id, "Session closed before its page arrived"),
        }
    }

    /// Re-runs the genre filter over everything accumulated so far
    async fn refilter(&self, id: Uuid) -> AppResult<()> {
        let ticket = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
            let genre = session
                .search
                .query()
                .map_or_else(|| ALL_GENRES.to_string(), |query| query.genre.clone());
            let items = session.search.accumulated();
            session.filter.begin(items, &genre)
        };

        let Some(ticket) = ticket else {
            return Ok(());
        };

        let filtered =
            filter_by_genre(&self.provider, &ticket.items, &ticket.genre, self.batch_size).await;

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.filter.complete(&ticket, filtered);
        }
        Ok(())
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {} not found", id))
}
