use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{AppError, AppResult};
use crate::models::{SearchQuery, SearchType};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Search {
        text: String,
        year: Option<String>,
        search_type: SearchType,
        page: u32,
    },
    Detail(String),
}

impl CacheKey {
    /// Key for one page of a title search; genre is not part of it
    pub fn search(query: &SearchQuery, page: u32) -> Self {
        CacheKey::Search {
            text: query.text.trim().to_lowercase(),
            year: query.year_filter().map(str::to_string),
            search_type: query.search_type,
            page,
        }
    }

    pub fn detail(id: &str) -> Self {
        CacheKey::Detail(id.trim().to_string())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search {
                text,
                year,
                search_type,
                page,
            } => write!(
                f,
                "search:{}:{}:{}:{}",
                text,
                year.as_deref().unwrap_or("-"),
                search_type,
                page
            ),
            CacheKey::Detail(id) => write!(f, "detail:{}", id),
        }
    }
}

/// How often and how patiently a failing loader is retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    /// Delay before the first retry, doubled for each following one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Exponential backoff: base, 2 * base, 4 * base, ...
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Settled result of a loader, successful or not
struct Outcome {
    result: AppResult<Value>,
    completed_at: Instant,
}

/// An in-flight or settled fetch; every caller of the same key awaits the same cell
type Slot = Arc<OnceCell<Outcome>>;

/// In-memory cache of upstream responses
///
/// Concurrent fetches of one key share a single loader run. Values are kept
/// as JSON so a single cache can hold search pages and detail records alike.
/// Entries (failures included) expire `ttl` after their loader settled.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<CacheKey, Slot>>>,
    ttl: Duration,
    retry: RetryPolicy,
}

/// Handle for gracefully shutting down the cache sweeper
pub struct CacheSweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheSweeperHandle {
    /// Signals the sweeper task and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache sweeper task failed");
        }
        tracing::info!("Cache sweeper stopped");
    }
}

impl QueryCache {
    pub fn new(ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            retry,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Spawns a background task that evicts expired entries every `interval`
    pub fn start_sweeper(&self, interval: Duration) -> CacheSweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let cache = self.clone();

        let task = tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "Cache sweeper started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = cache.len(), "Evicted expired cache entries");
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        CacheSweeperHandle { shutdown_tx, task }
    }

    /// Returns the cached value for `key`, running `loader` only on a miss
    ///
    /// Callers arriving while a load is in flight wait for that load instead
    /// of starting their own. Transient loader errors are retried per the
    /// retry policy; the final error is cached for the key until it expires
    /// or is refetched.
    pub async fn fetch<T, F, Fut>(&self, key: CacheKey, loader: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let slot = self.slot(&key);

        if slot.initialized() {
            tracing::debug!(key = %key, "Cache hit");
        }

        let outcome = slot
            .get_or_init(|| async {
                tracing::debug!(key = %key, "Cache miss");
                let result = self.load_with_retry(&key, &loader).await;
                Outcome {
                    result,
                    completed_at: Instant::now(),
                }
            })
            .await;

        match &outcome.result {
            Ok(value) => serde_json::from_value(value.clone()).map_err(|e| {
                AppError::Internal(format!("Cache deserialization error: {}", e))
            }),
            Err(e) => Err(e.clone()),
        }
    }

    /// Drops whatever is cached for `key` and loads it again
    pub async fn refetch<T, F, Fut>(&self, key: CacheKey, loader: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.invalidate(&key);
        self.fetch(key, loader).await
    }

    /// Removes the entry for `key`, returning whether one existed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Removes every settled entry older than the TTL
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, slot| !self.is_expired(slot, now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Finds or creates the slot for `key` under one lock acquisition
    fn slot(&self, key: &CacheKey) -> Slot {
        let now = Instant::now();
        let mut entries = self.lock();

        if let Some(slot) = entries.get(key) {
            if !self.is_expired(slot, now) {
                return slot.clone();
            }
            tracing::debug!(key = %key, "Cache entry expired");
        }

        let slot: Slot = Arc::new(OnceCell::new());
        entries.insert(key.clone(), slot.clone());
        slot
    }

    fn is_expired(&self, slot: &Slot, now: Instant) -> bool {
        match slot.get() {
            Some(outcome) => now.saturating_duration_since(outcome.completed_at) >= self.ttl,
            None => false,
        }
    }

    async fn load_with_retry<T, F, Fut>(&self, key: &CacheKey, loader: &F) -> AppResult<Value>
    where
        T: Serialize,
        F: Fn() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;

        loop {
            match loader().await {
                Ok(value) => {
                    return serde_json::to_value(&value).map_err(|e| {
                        AppError::Internal(format!("Cache serialization error: {}", e))
                    });
                }
                Err(e) if e.is_transient() && attempt < self.retry.retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        key = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(key = %key, attempts = attempt + 1, error = %e, "Fetch failed");
                    return Err(e);
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
