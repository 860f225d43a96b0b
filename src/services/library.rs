//! Personal movie lists
//!
//! `Library::apply` is the single place list state changes. `LibraryStore`
//! wraps it with persistence: the watchlist, favorites and watched lists
//! live in a JSON file that is read once at startup and rewritten after
//! every change. The compare list only lives in memory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetail, MovieSummary},
    services::providers::MovieProvider,
};

/// Most movies that can be compared side by side
pub const MAX_COMPARE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Watchlist,
    Favorites,
    Watched,
    Compare,
}

impl ListKind {
    pub fn is_persisted(&self) -> bool {
        !matches!(self, ListKind::Compare)
    }
}

#[derive(Debug, Clone)]
pub enum LibraryAction {
    Add(ListKind, MovieSummary),
    Remove(ListKind, String),
    Clear(ListKind),
}

impl LibraryAction {
    pub fn list(&self) -> ListKind {
        match self {
            LibraryAction::Add(kind, _) | LibraryAction::Remove(kind, _) | LibraryAction::Clear(kind) => {
                *kind
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Library {
    pub watchlist: Vec<MovieSummary>,
    pub favorites: Vec<MovieSummary>,
    pub watched: Vec<MovieSummary>,
    pub compare: Vec<MovieSummary>,
}

/// On-disk layout: one JSON array per persisted list
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedLists {
    #[serde(default)]
    watchlist: Vec<MovieSummary>,
    #[serde(default)]
    favorites: Vec<MovieSummary>,
    #[serde(default)]
    watched: Vec<MovieSummary>,
}

impl From<PersistedLists> for Library {
    fn from(lists: PersistedLists) -> Self {
        Library {
            watchlist: lists.watchlist,
            favorites: lists.favorites,
            watched: lists.watched,
            compare: Vec::new(),
        }
    }
}

impl From<&Library> for PersistedLists {
    fn from(library: &Library) -> Self {
        PersistedLists {
            watchlist: library.watchlist.clone(),
            favorites: library.favorites.clone(),
            watched: library.watched.clone(),
        }
    }
}

impl Library {
    pub fn list(&self, kind: ListKind) -> &[MovieSummary] {
        match kind {
            ListKind::Watchlist => &self.watchlist,
            ListKind::Favorites => &self.favorites,
            ListKind::Watched => &self.watched,
            ListKind::Compare => &self.compare,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<MovieSummary> {
        match kind {
            ListKind::Watchlist => &mut self.watchlist,
            ListKind::Favorites => &mut self.favorites,
            ListKind::Watched => &mut self.watched,
            ListKind::Compare => &mut self.compare,
        }
    }

    pub fn contains(&self, kind: ListKind, id: &str) -> bool {
        self.list(kind).iter().any(|movie| movie.id == id)
    }

    /// Applies `action`, returning whether any list changed
    ///
    /// Adding a movie already on the list is a no-op.
    pub fn apply(&mut self, action: LibraryAction) -> AppResult<bool> {
        match action {
            LibraryAction::Add(kind, movie) => {
                if self.contains(kind, &movie.id) {
                    return Ok(false);
                }
                if kind == ListKind::Compare && self.compare.len() >= MAX_COMPARE {
                    return Err(AppError::InvalidInput(format!(
                        "At most {} movies can be compared",
                        MAX_COMPARE
                    )));
                }
                self.list_mut(kind).push(movie);
                Ok(true)
            }
            LibraryAction::Remove(kind, id) => {
                let list = self.list_mut(kind);
                let before = list.len();
                list.retain(|movie| movie.id != id);
                Ok(list.len() != before)
            }
            LibraryAction::Clear(kind) => {
                let list = self.list_mut(kind);
                let changed = !list.is_empty();
                list.clear();
                Ok(changed)
            }
        }
    }
}

pub struct LibraryStore {
    path: PathBuf,
    library: Mutex<Library>,
}

impl LibraryStore {
    /// Loads the library from `path`; a missing file means an empty library
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();

        let library = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let lists: PersistedLists = serde_json::from_str(&raw).map_err(|e| {
                    AppError::Storage(format!("Invalid library file {}: {}", path.display(), e))
                })?;
                Library::from(lists)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No library file yet, starting empty");
                Library::default()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            watchlist = library.watchlist.len(),
            favorites = library.favorites.len(),
            watched = library.watched.len(),
            "Library loaded"
        );

        Ok(Self {
            path,
            library: Mutex::new(library),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> Library {
        self.library.lock().await.clone()
    }

    /// Applies `action` and writes the file if a persisted list changed
    ///
    /// The in-memory state only moves forward once the write succeeded.
    pub async fn apply(&self, action: LibraryAction) -> AppResult<Library> {
        let mut library = self.library.lock().await;
        let kind = action.list();

        let mut next = library.clone();
        let changed = next.apply(action)?;

        if changed && kind.is_persisted() {
            self.persist(&next).await?;
        }

        *library = next;
        Ok(library.clone())
    }

    async fn persist(&self, library: &Library) -> AppResult<()> {
        let json = serde_json::to_string_pretty(&PersistedLists::from(library))
            .map_err(|e| AppError::Internal(format!("Library serialization error: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Library saved");
        Ok(())
    }
}

/// Full records for every movie on the compare list, in list order
pub async fn compare_details(
    provider: &Arc<dyn MovieProvider>,
    library: &Library,
) -> AppResult<Vec<MovieDetail>> {
    let tasks: Vec<_> = library
        .compare
        .iter()
        .map(|movie| {
            let provider = Arc::clone(provider);
            let id = movie.id.clone();
            tokio::spawn(async move { provider.fetch_detail(&id).await })
        })
        .collect();

    let mut details = Vec::with_capacity(tasks.len());
    for task in tasks {
        let detail = task
            .await
            .map_err(|e| AppError::Internal(format!("Detail task join error: {}", e)))??;
        details.push(detail);
    }

    Ok(details)
}
