use serde::{Deserialize, Serialize};

/// Entry of the local actor directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorRecord {
    pub name: String,
    /// Titles in the order they are listed for the actor
    pub known_movie_titles: Vec<String>,
    pub genres: Vec<String>,
    pub birth_year: i32,
    pub nationality: String,
}

impl ActorRecord {
    pub fn new(
        name: &str,
        known_movie_titles: &[&str],
        genres: &[&str],
        birth_year: i32,
        nationality: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            known_movie_titles: known_movie_titles.iter().map(|t| t.to_string()).collect(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            birth_year,
            nationality: nationality.to_string(),
        }
    }

    /// Lower-case, dash-separated form of the name used in placeholder ids
    pub fn slug(&self) -> String {
        self.name
            .split_whitespace()
            .map(|part| {
                part.chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}
