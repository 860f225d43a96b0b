//! Local actor directory
//!
//! Stands in for an actor database: a fixed set of records answering name
//! and title queries, plus placeholder filmographies shaped like search pages.

use rand::Rng;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{ActorRecord, MediaType, MovieSummary, ResultPage},
};

/// Filmography entries per page
pub const ACTOR_PAGE_SIZE: usize = 10;

/// Leading phrases users type before an actor name
const FILLER_PREFIXES: &[&str] = &[
    "movies by ",
    "movies with ",
    "movies starring ",
    "films by ",
    "films with ",
    "films starring ",
    "starring ",
    "actor ",
    "actress ",
];

/// Placeholder release years are drawn from this range
const FIRST_YEAR: i32 = 1990;
const END_YEAR: i32 = 2020;

/// Trims the query and strips one leading filler phrase, ignoring case
pub fn normalize_query(query: &str) -> &str {
    let trimmed = query.trim();

    for prefix in FILLER_PREFIXES {
        let matches = trimmed
            .get(..prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return trimmed[prefix.len()..].trim();
        }
    }

    trimmed
}

pub struct ActorDirectory {
    records: Vec<ActorRecord>,
}

impl Default for ActorDirectory {
    fn default() -> Self {
        Self::new(builtin_records())
    }
}

impl ActorDirectory {
    pub fn new(records: Vec<ActorRecord>) -> Self {
        Self { records }
    }

    /// Loads a JSON array of actor records
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let records: Vec<ActorRecord> = serde_json::from_str(&raw).map_err(|e| {
            AppError::Storage(format!(
                "Invalid actor dataset {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(path = %path.display(), actors = records.len(), "Loaded actor dataset");

        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[ActorRecord] {
        &self.records
    }

    /// Actors whose name matches the query in either direction, or who are
    /// known for a title containing it. Dataset order.
    pub fn search_by_name_or_movie(&self, query: &str) -> Vec<ActorRecord> {
        let needle = normalize_query(query).to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|actor| {
                let name = actor.name.to_lowercase();
                name.contains(&needle)
                    || needle.contains(&name)
                    || actor
                        .known_movie_titles
                        .iter()
                        .any(|title| title.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Exact name match first, then the first partial match either way
    pub fn find_actor(&self, name: &str) -> Option<&ActorRecord> {
        let needle = normalize_query(name).to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.records
            .iter()
            .find(|actor| actor.name.to_lowercase() == needle)
            .or_else(|| {
                self.records.iter().find(|actor| {
                    let candidate = actor.name.to_lowercase();
                    candidate.contains(&needle) || needle.contains(&candidate)
                })
            })
    }

    /// The actor's known titles as movie summaries
    ///
    /// Years are placeholders drawn at random on every call, so two calls
    /// for the same actor generally disagree on them.
    pub fn movies_for_actor(&self, name: &str) -> ResultPage {
        let Some(actor) = self.find_actor(name) else {
            tracing::debug!(query = %name, "No actor matched");
            return ResultPage::failure("Actor not found!");
        };

        let slug = actor.slug();
        let mut rng = rand::thread_rng();

        let items: Vec<MovieSummary> = actor
            .known_movie_titles
            .iter()
            .enumerate()
            .map(|(index, title)| MovieSummary {
                id: format!("actor-{}-{}", slug, index),
                title: title.clone(),
                year: rng.gen_range(FIRST_YEAR..END_YEAR).to_string(),
                media_type: MediaType::Movie,
                poster_url: "N/A".to_string(),
            })
            .collect();

        let total = items.len() as u32;
        ResultPage::success(items, total)
    }

    /// One page (1-based) of `movies_for_actor`
    ///
    /// Pages past the end are empty but successful; `total_results` is
    /// always the full filmography size.
    pub fn paginated(&self, name: &str, page: u32) -> ResultPage {
        let full = self.movies_for_actor(name);
        if !full.success {
            return full;
        }

        let start = (page.max(1) as usize - 1) * ACTOR_PAGE_SIZE;
        let items = full
            .items
            .into_iter()
            .skip(start)
            .take(ACTOR_PAGE_SIZE)
            .collect();

        ResultPage::success(items, full.total_results)
    }
}

fn builtin_records() -> Vec<ActorRecord> {
    vec![
        ActorRecord::new(
            "Tom Hanks",
            &[
                "Forrest Gump",
                "Cast Away",
                "Saving Private Ryan",
                "Philadelphia",
                "Big",
                "Apollo 13",
                "The Green Mile",
                "Toy Story",
                "Catch Me If You Can",
                "Captain Phillips",
                "The Terminal",
                "Sully",
            ],
            &["Drama", "Comedy", "Adventure"],
            1956,
            "American",
        ),
        ActorRecord::new(
            "Meryl Streep",
            &[
                "The Devil Wears Prada",
                "Sophie's Choice",
                "Kramer vs. Kramer",
                "Mamma Mia!",
                "The Iron Lady",
                "Julie & Julia",
                "Doubt",
                "Out of Africa",
            ],
            &["Drama", "Comedy", "Biography"],
            1949,
            "American",
        ),
        ActorRecord::new(
            "Leonardo DiCaprio",
            &[
                "Titanic",
                "Inception",
                "The Revenant",
                "The Wolf of Wall Street",
                "Catch Me If You Can",
                "Shutter Island",
                "The Departed",
                "Django Unchained",
                "Once Upon a Time in Hollywood",
            ],
            &["Drama", "Thriller", "Crime"],
            1974,
            "American",
        ),
        ActorRecord::new(
            "Denzel Washington",
            &[
                "Training Day",
                "Glory",
                "Malcolm X",
                "Philadelphia",
                "Remember the Titans",
                "The Equalizer",
                "Fences",
                "Man on Fire",
            ],
            &["Drama", "Action", "Crime"],
            1954,
            "American",
        ),
        ActorRecord::new(
            "Scarlett Johansson",
            &[
                "Lost in Translation",
                "Lucy",
                "Marriage Story",
                "Her",
                "Jojo Rabbit",
                "Black Widow",
                "The Avengers",
                "Match Point",
            ],
            &["Drama", "Action", "Sci-Fi"],
            1984,
            "American",
        ),
        ActorRecord::new(
            "Keanu Reeves",
            &[
                "The Matrix",
                "John Wick",
                "Speed",
                "Point Break",
                "Constantine",
                "The Devil's Advocate",
                "Bill & Ted's Excellent Adventure",
            ],
            &["Action", "Sci-Fi", "Thriller"],
            1964,
            "Canadian",
        ),
        ActorRecord::new(
            "Cate Blanchett",
            &[
                "Elizabeth",
                "Blue Jasmine",
                "Carol",
                "Tár",
                "The Aviator",
                "Notes on a Scandal",
            ],
            &["Drama", "Biography"],
            1969,
            "Australian",
        ),
        ActorRecord::new(
            "Samuel L. Jackson",
            &[
                "Pulp Fiction",
                "Jackie Brown",
                "Django Unchained",
                "Unbreakable",
                "Snakes on a Plane",
                "The Hateful Eight",
                "Jurassic Park",
            ],
            &["Action", "Crime", "Thriller"],
            1948,
            "American",
        ),
        ActorRecord::new(
            "Penélope Cruz",
            &[
                "Volver",
                "Vicky Cristina Barcelona",
                "All About My Mother",
                "Parallel Mothers",
                "Vanilla Sky",
                "Pain and Glory",
            ],
            &["Drama", "Romance"],
            1974,
            "Spanish",
        ),
        ActorRecord::new(
            "Song Kang-ho",
            &[
                "Parasite",
                "Memories of Murder",
                "The Host",
                "Snowpiercer",
                "Broker",
                "Secret Sunshine",
            ],
            &["Drama", "Thriller", "Crime"],
            1967,
            "South Korean",
        ),
        ActorRecord::new(
            "Toshiro Mifune",
            &[
                "Seven Samurai",
                "Rashomon",
                "Yojimbo",
                "Throne of Blood",
                "Red Beard",
                "High and Low",
            ],
            &["Action", "Drama"],
            1920,
            "Japanese",
        ),
        ActorRecord::new(
            "Viola Davis",
            &[
                "Fences",
                "The Help",
                "Widows",
                "Doubt",
                "Ma Rainey's Black Bottom",
                "The Woman King",
            ],
            &["Drama", "Action"],
            1965,
            "American",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[ActorRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    fn prolific_directory(titles: usize) -> ActorDirectory {
        let titles: Vec<String> = (1..=titles).map(|i| format!("Feature {}", i)).collect();
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        ActorDirectory::new(vec![ActorRecord::new(
            "Jane Prolific",
            &title_refs,
            &["Drama"],
            1970,
            "British",
        )])
    }

    #[test]
    fn test_normalize_strips_filler_prefix() {
        assert_eq!(normalize_query("movies by Tom Hanks"), "Tom Hanks");
        assert_eq!(normalize_query("  MOVIES WITH  Viola Davis "), "Viola Davis");
        assert_eq!(normalize_query("Actor Keanu Reeves"), "Keanu Reeves");
        assert_eq!(normalize_query("Tom Hanks"), "Tom Hanks");
    }

    #[test]
    fn test_normalize_only_strips_leading_prefix() {
        assert_eq!(normalize_query("Tom Hanks movies by"), "Tom Hanks movies by");
    }

    #[test]
    fn test_normalize_handles_multibyte_input() {
        assert_eq!(normalize_query("é"), "é");
        assert_eq!(normalize_query("actress Penélope Cruz"), "Penélope Cruz");
    }

    #[test]
    fn test_search_with_filler_matches_plain_search() {
        let directory = ActorDirectory::default();
        let with_filler = directory.search_by_name_or_movie("movies by Tom Hanks");
        let plain = directory.search_by_name_or_movie("Tom Hanks");
        assert_eq!(with_filler, plain);
        assert_eq!(names(&plain), vec!["Tom Hanks"]);
    }

    #[test]
    fn test_search_by_partial_name() {
        let directory = ActorDirectory::default();
        let results = directory.search_by_name_or_movie("hanks");
        assert_eq!(names(&results), vec!["Tom Hanks"]);
    }

    #[test]
    fn test_search_name_contained_in_query() {
        let directory = ActorDirectory::default();
        let results = directory.search_by_name_or_movie("keanu reeves filmography");
        assert_eq!(names(&results), vec!["Keanu Reeves"]);
    }

    #[test]
    fn test_search_by_movie_title_keeps_dataset_order() {
        let directory = ActorDirectory::default();
        let results = directory.search_by_name_or_movie("philadelphia");
        assert_eq!(names(&results), vec!["Tom Hanks", "Denzel Washington"]);

        let results = directory.search_by_name_or_movie("Django");
        assert_eq!(names(&results), vec!["Leonardo DiCaprio", "Samuel L. Jackson"]);
    }

    #[test]
    fn test_search_empty_query() {
        let directory = ActorDirectory::default();
        assert!(directory.search_by_name_or_movie("   ").is_empty());
        assert!(directory.search_by_name_or_movie("movies by ").is_empty());
    }

    #[test]
    fn test_find_actor_prefers_exact_match() {
        let directory = ActorDirectory::new(vec![
            ActorRecord::new("Chris Evans Jr", &[], &[], 1990, "American"),
            ActorRecord::new("Chris Evans", &[], &[], 1981, "American"),
        ]);
        assert_eq!(directory.find_actor("chris evans").unwrap().name, "Chris Evans");
        assert_eq!(directory.find_actor("evans").unwrap().name, "Chris Evans Jr");
    }

    #[test]
    fn test_movies_for_actor() {
        let directory = ActorDirectory::default();
        let page = directory.movies_for_actor("movies starring Keanu Reeves");

        assert!(page.success);
        assert_eq!(page.total_results, 7);
        assert_eq!(page.items[0].title, "The Matrix");
        assert_eq!(page.items[0].id, "actor-keanu-reeves-0");
        assert_eq!(page.items[6].id, "actor-keanu-reeves-6");
        for item in &page.items {
            let year: i32 = item.year.parse().unwrap();
            assert!((FIRST_YEAR..END_YEAR).contains(&year));
            assert_eq!(item.media_type, MediaType::Movie);
        }
    }

    #[test]
    fn test_movies_for_unknown_actor() {
        let directory = ActorDirectory::default();
        let page = directory.movies_for_actor("Nobody Atall");

        assert!(!page.success);
        assert!(page.items.is_empty());
        assert_eq!(page.error_message.as_deref(), Some("Actor not found!"));
    }

    #[test]
    fn test_paginated_slices_by_ten() {
        let directory = prolific_directory(23);

        let first = directory.paginated("Jane Prolific", 1);
        let second = directory.paginated("Jane Prolific", 2);
        let third = directory.paginated("Jane Prolific", 3);
        let beyond = directory.paginated("Jane Prolific", 4);

        assert_eq!(first.items.len(), 10);
        assert_eq!(second.items.len(), 10);
        assert_eq!(third.items.len(), 3);
        assert!(beyond.success);
        assert!(beyond.items.is_empty());

        assert_eq!(first.total_results, 23);
        assert_eq!(third.total_results, 23);
        assert_eq!(second.items[0].title, "Feature 11");
        assert_eq!(third.items[2].id, "actor-jane-prolific-22");
    }

    #[test]
    fn test_paginated_unknown_actor_fails() {
        let directory = prolific_directory(3);
        assert!(!directory.paginated("Someone Else", 1).success);
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actors.json");
        let records = vec![ActorRecord::new("Jane Doe", &["Untitled"], &["Drama"], 1980, "Irish")];
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let directory = ActorDirectory::load(&path).await.unwrap();
        assert_eq!(directory.records(), records.as_slice());
    }

    #[tokio::test]
    async fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actors.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = ActorDirectory::load(&path).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
