//! Wire types for the OMDb API
//!
//! OMDb answers HTTP 200 for most failures and reports them through the
//! `Response` field ("True" / "False"), so every conversion checks it.

use serde::Deserialize;

use super::{MediaType, MovieDetail, MovieSummary, Rating, ResultPage};
use crate::error::{AppError, AppResult};

const NOT_AVAILABLE: &str = "N/A";

fn succeeded(response: &str) -> bool {
    response.eq_ignore_ascii_case("true")
}

/// Drops OMDb's "N/A" placeholder
fn available(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && v != NOT_AVAILABLE)
}

/// Raw response from `GET /?s=...`
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbSearchItem>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchItem {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
}

impl From<OmdbSearchItem> for MovieSummary {
    fn from(item: OmdbSearchItem) -> Self {
        MovieSummary {
            id: item.imdb_id,
            title: item.title,
            year: item.year,
            media_type: MediaType::from_api(&item.item_type),
            poster_url: item.poster.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

impl From<OmdbSearchResponse> for ResultPage {
    fn from(response: OmdbSearchResponse) -> Self {
        if !succeeded(&response.response) {
            return ResultPage::failure(
                response
                    .error
                    .unwrap_or_else(|| "Movie not found!".to_string()),
            );
        }

        let total_results = response
            .total_results
            .as_deref()
            .and_then(|total| total.trim().parse::<u32>().ok())
            .unwrap_or(0);

        ResultPage::success(
            response.search.into_iter().map(MovieSummary::from).collect(),
            total_results,
        )
    }
}

/// Raw response from `GET /?i=...`
///
/// Every field is optional because a failed lookup carries only
/// `Response` and `Error`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbDetail {
    pub title: Option<String>,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub released: Option<String>,
    pub runtime: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub poster: Option<String>,
    #[serde(default)]
    pub ratings: Vec<OmdbRating>,
    pub metascore: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub box_office: Option<String>,
    pub response: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbRating {
    pub source: String,
    pub value: String,
}

impl OmdbDetail {
    /// Converts into a `MovieDetail`, turning `Response: "False"` into `NotFound`
    pub fn into_detail(self, requested_id: &str) -> AppResult<MovieDetail> {
        if !succeeded(&self.response) {
            return Err(AppError::NotFound(format!(
                "{}: {}",
                requested_id,
                self.error.unwrap_or_else(|| "Incorrect IMDb ID.".to_string())
            )));
        }

        let summary = MovieSummary {
            id: self.imdb_id.unwrap_or_else(|| requested_id.to_string()),
            title: self.title.unwrap_or_default(),
            year: self.year.unwrap_or_default(),
            media_type: self
                .item_type
                .as_deref()
                .map(MediaType::from_api)
                .unwrap_or(MediaType::Movie),
            poster_url: self.poster.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        };

        Ok(MovieDetail {
            summary,
            genre: available(self.genre).unwrap_or_default(),
            plot: available(self.plot),
            director: available(self.director),
            writer: available(self.writer),
            actors: available(self.actors),
            ratings: self
                .ratings
                .into_iter()
                .map(|r| Rating {
                    source: r.source,
                    value: r.value,
                })
                .collect(),
            runtime: available(self.runtime),
            box_office: available(self.box_office),
            rated: available(self.rated),
            released: available(self.released),
            language: available(self.language),
            country: available(self.country),
            awards: available(self.awards),
            imdb_rating: available(self.imdb_rating),
            imdb_votes: available(self.imdb_votes),
            metascore: available(self.metascore),
        })
    }
}
