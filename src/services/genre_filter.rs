//! Genre filtering the search endpoint cannot do itself
//!
//! Each candidate's detail record is fetched (through the query cache) and
//! its genre list inspected. Batches run one after another so at most
//! `batch_size` detail requests are in flight at once.

use std::sync::Arc;

use crate::{
    models::{is_all_genres, MovieSummary},
    services::providers::MovieProvider,
};

/// Keeps the items whose detail record lists `genre`, preserving order
///
/// `"all"` returns `items` untouched without any request. An item whose
/// details cannot be fetched is left out; the rest of the pass continues.
pub async fn filter_by_genre(
    provider: &Arc<dyn MovieProvider>,
    items: &[MovieSummary],
    genre: &str,
    batch_size: usize,
) -> Vec<MovieSummary> {
    if is_all_genres(genre) {
        return items.to_vec();
    }

    let mut kept = Vec::new();
    let mut failed = 0usize;

    for batch in items.chunks(batch_size.max(1)) {
        let tasks: Vec<_> = batch
            .iter()
            .map(|item| {
                let provider = Arc::clone(provider);
                let id = item.id.clone();
                tokio::spawn(async move { provider.fetch_detail(&id).await })
            })
            .collect();

        for (item, task) in batch.iter().zip(tasks) {
            match task.await {
                Ok(Ok(detail)) => {
                    if detail.has_genre(genre) {
                        kept.push(item.clone());
                    }
                }
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::debug!(id = %item.id, error = %e, "Excluding title without details");
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(id = %item.id, error = %e, "Detail task join error");
                }
            }
        }
    }

    if failed > 0 {
        tracing::warn!(genre = %genre, failed, "Some details could not be fetched while filtering");
    }

    tracing::info!(
        genre = %genre,
        input = items.len(),
        kept = kept.len(),
        "Genre filter applied"
    );

    kept
}

/// A filter pass handed out by `GenreFilter::begin`
#[derive(Debug, Clone)]
pub struct FilterTicket {
    pub generation: u64,
    pub items: Vec<MovieSummary>,
    pub genre: String,
}

/// Latest filtered list plus the bookkeeping to ignore superseded passes
///
/// Every `begin` starts a new generation; only the pass of the newest
/// generation may publish its result, whatever order passes finish in.
#[derive(Debug, Default)]
pub struct GenreFilter {
    generation: u64,
    filtered: Vec<MovieSummary>,
    filtering: bool,
}

impl GenreFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a pass over `items`; `"all"` is applied at once and yields no ticket
    pub fn begin(&mut self, items: Vec<MovieSummary>, genre: &str) -> Option<FilterTicket> {
        self.generation += 1;

        if is_all_genres(genre) {
            self.filtered = items;
            self.filtering = false;
            return None;
        }

        self.filtering = true;
        Some(FilterTicket {
            generation: self.generation,
            items,
            genre: genre.trim().to_string(),
        })
    }

    /// Publishes the result of a pass; returns false if a newer pass started
    pub fn complete(&mut self, ticket: &FilterTicket, filtered: Vec<MovieSummary>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                genre = %ticket.genre,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "Discarding superseded filter pass"
            );
            return false;
        }

        self.filtered = filtered;
        self.filtering = false;
        true
    }

    pub fn filtered(&self) -> &[MovieSummary] {
        &self.filtered
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }
}
