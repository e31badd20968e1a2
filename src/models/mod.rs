use serde::{Deserialize, Serialize};

mod movie;

pub use movie::{MovieRecord, Recommendation, NO_TAGS};

/// Identifier of a movie in the source tables
pub type MovieId = u32;

// ============================================================================
// Source Table Rows
// ============================================================================

/// One row of the movies table
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRow {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: String,
}

/// One row of the tags table
///
/// Any other columns (user id, timestamp) are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRow {
    pub movie_id: MovieId,
    #[serde(default)]
    pub tag: Option<String>,
}

/// Embedding vector of a single movie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingVector(pub Vec<f32>);

impl EmbeddingVector {
    /// All-zero vector of the given dimensionality
    pub fn zeros(dimensions: usize) -> Self {
        Self(vec![0.0; dimensions])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}
