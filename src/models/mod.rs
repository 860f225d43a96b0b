use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod actor;
pub mod omdb;

pub use actor::ActorRecord;

/// Genre selector value meaning "no genre filter"
pub const ALL_GENRES: &str = "all";

/// Kind of entry returned by the movie database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
    Episode,
}

impl MediaType {
    /// Maps an OMDb `Type` value; anything unrecognised is treated as a movie
    pub fn from_api(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "series" => MediaType::Series,
            "episode" => MediaType::Episode,
            _ => MediaType::Movie,
        }
    }
}

/// Which data source a search is answered from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Title search against the movie database
    #[default]
    Movie,
    /// Filmography of an actor from the actor directory
    Actor,
    /// Title search, with matching actors listed alongside
    Both,
}

impl Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchType::Movie => write!(f, "movie"),
            SearchType::Actor => write!(f, "actor"),
            SearchType::Both => write!(f, "both"),
        }
    }
}

/// Search input as entered by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default = "default_genre")]
    pub genre: String,
    #[serde(default)]
    pub search_type: SearchType,
}

fn default_genre() -> String {
    ALL_GENRES.to_string()
}

/// True for the "all" sentinel (any case) and for a blank selector
pub fn is_all_genres(genre: &str) -> bool {
    let genre = genre.trim();
    genre.is_empty() || genre.eq_ignore_ascii_case(ALL_GENRES)
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            year: None,
            genre: default_genre(),
            search_type: SearchType::Movie,
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Year filter with blank values treated as absent
    pub fn year_filter(&self) -> Option<&str> {
        self.year
            .as_deref()
            .map(str::trim)
            .filter(|year| !year.is_empty())
    }

    /// True when `other` selects the same result pages as `self`
    ///
    /// Genre is deliberately absent: it only narrows what was already fetched.
    pub fn same_pages_as(&self, other: &SearchQuery) -> bool {
        self.text.trim() == other.text.trim()
            && self.year_filter() == other.year_filter()
            && self.search_type == other.search_type
    }

    pub fn filters_by_genre(&self) -> bool {
        !is_all_genres(&self.genre)
    }
}

/// One search hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieSummary {
    /// External identifier (IMDb id for OMDb results)
    pub id: String,
    pub title: String,
    pub year: String,
    pub media_type: MediaType,
    pub poster_url: String,
}

/// A rating from one review source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub source: String,
    pub value: String,
}

/// Full record for a single title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    /// Comma-separated genre names, e.g. "Action, Crime, Drama"
    pub genre: String,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub actors: Option<String>,
    pub ratings: Vec<Rating>,
    pub runtime: Option<String>,
    pub box_office: Option<String>,
    pub rated: Option<String>,
    pub released: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub imdb_rating: Option<String>,
    pub imdb_votes: Option<String>,
    pub metascore: Option<String>,
}

impl MovieDetail {
    /// Individual genre names, trimmed
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre
            .split(',')
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
    }

    /// Case-insensitive membership test against the genre list
    pub fn has_genre(&self, genre: &str) -> bool {
        let wanted = genre.trim();
        self.genres().any(|g| g.eq_ignore_ascii_case(wanted))
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultPage {
    pub items: Vec<MovieSummary>,
    pub total_results: u32,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ResultPage {
    pub fn success(items: Vec<MovieSummary>, total_results: u32) -> Self {
        Self {
            items,
            total_results,
            success: true,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total_results: 0,
            success: false,
            error_message: Some(message.into()),
        }
    }
}
