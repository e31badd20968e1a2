use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::MovieId;

/// Placeholder tag text for movies nobody has tagged
pub const NO_TAGS: &str = "notags";

/// A movie with its normalized title, genres and merged user tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    /// Unique identifier from the movies table
    pub movie_id: MovieId,
    /// Title without wrapping quotes or release year
    pub title: String,
    /// Genres in source order
    pub genres: Vec<String>,
    /// Distinct user tags
    pub tags: BTreeSet<String>,
}

impl MovieRecord {
    /// Creates a record with no tags
    pub fn new(movie_id: MovieId, title: String, genres: Vec<String>) -> Self {
        Self {
            movie_id,
            title,
            genres,
            tags: BTreeSet::new(),
        }
    }

    /// Adds a tag, ignoring duplicates
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.contains(tag) {
            self.tags.insert(tag.to_string());
        }
    }

    /// Genres joined with single spaces
    pub fn genre_text(&self) -> String {
        self.genres.join(" ")
    }

    /// Tags joined with single spaces, or the placeholder when untagged
    pub fn tag_text(&self) -> String {
        if self.tags.is_empty() {
            NO_TAGS.to_string()
        } else {
            self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
        }
    }
}

/// A single recommended movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    /// Cosine similarity to the query movie
    pub score: f32,
}
