//! Pretrained word embeddings
//!
//! The vectorizer only sees the `EmbeddingLookup` trait, so the pretrained
//! model can be swapped for a small synthetic vocabulary. `WordVectors` is the
//! in-memory store both file readers produce.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

pub mod text;
pub mod word2vec;

/// Upper bound on floats reserved ahead of time from a declared size
const MAX_RESERVED_VALUES: usize = 1 << 24;

/// Read-only word to vector lookup
pub trait EmbeddingLookup: Send + Sync {
    /// Length of every vector in the vocabulary
    fn dimensions(&self) -> usize;

    /// Vector for `word`, or `None` when it is out of vocabulary
    fn vector_of(&self, word: &str) -> Option<&[f32]>;

    /// Whether `word` is in the vocabulary
    fn contains(&self, word: &str) -> bool {
        self.vector_of(word).is_some()
    }
}

/// On-disk layout of a pretrained vector file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFormat {
    /// word2vec binary (`<count> <dims>` header, little-endian f32 rows)
    #[default]
    Binary,
    /// word2vec / GloVe text, one `word v1 .. vN` entry per line
    Text,
}

/// Word vectors held in one contiguous buffer
#[derive(Debug, Clone)]
pub struct WordVectors {
    dimensions: usize,
    index: HashMap<String, usize>,
    values: Vec<f32>,
}

impl WordVectors {
    /// Creates an empty vocabulary of the given dimensionality
    pub fn new(dimensions: usize) -> Self {
        Self::with_capacity(dimensions, 0)
    }

    /// Reserves room for up to `words` entries
    ///
    /// The reservation is capped at `MAX_RESERVED_VALUES` floats; past that the
    /// buffers grow as entries are inserted.
    pub fn with_capacity(dimensions: usize, words: usize) -> Self {
        let words = words.min(MAX_RESERVED_VALUES / dimensions.max(1));
        Self {
            dimensions,
            index: HashMap::with_capacity(words),
            values: Vec::with_capacity(words * dimensions),
        }
    }

    /// Builds a vocabulary from `(word, vector)` pairs
    pub fn from_entries<I, S>(dimensions: usize, entries: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut vectors = Self::new(dimensions);
        for (word, vector) in entries {
            vectors.insert(word.into(), &vector)?;
        }
        Ok(vectors)
    }

    /// Loads a pretrained vector file
    ///
    /// `limit` keeps only the first N words, which for frequency-sorted files
    /// are the most common ones.
    pub fn load(
        path: impl AsRef<Path>,
        format: EmbeddingFormat,
        limit: Option<usize>,
    ) -> AppResult<Self> {
        let start = Instant::now();
        let reader = BufReader::new(File::open(path.as_ref())?);

        let vectors = match format {
            EmbeddingFormat::Binary => word2vec::read_binary(reader, limit)?,
            EmbeddingFormat::Text => text::read_text(reader, limit)?,
        };

        tracing::info!(
            path = %path.as_ref().display(),
            format = ?format,
            words = vectors.len(),
            dimensions = vectors.dimensions,
            processing_time_ms = start.elapsed().as_millis(),
            "Embedding vocabulary loaded"
        );

        Ok(vectors)
    }

    /// Adds a word; returns `false` and keeps the old vector if it is already present
    pub fn insert(&mut self, word: String, vector: &[f32]) -> AppResult<bool> {
        if vector.len() != self.dimensions {
            return Err(AppError::InvalidInput(format!(
                "vector for '{}' has {} dimensions, expected {}",
                word,
                vector.len(),
                self.dimensions
            )));
        }
        if self.index.contains_key(&word) {
            return Ok(false);
        }

        self.index.insert(word, self.index.len());
        self.values.extend_from_slice(vector);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl EmbeddingLookup for WordVectors {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vector_of(&self, word: &str) -> Option<&[f32]> {
        let row = *self.index.get(word)?;
        let start = row * self.dimensions;
        Some(&self.values[start..start + self.dimensions])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_lookup() {
        let vectors =
            WordVectors::from_entries(2, [("toy", vec![1.0, 0.0]), ("story", vec![0.0, 1.0])])
                .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.dimensions(), 2);
        assert_eq!(vectors.vector_of("story"), Some(&[0.0, 1.0][..]));
        assert!(vectors.contains("toy"));
        assert!(!vectors.contains("heat"));
        assert_eq!(vectors.vector_of("heat"), None);
    }

    #[test]
    fn test_duplicate_word_keeps_first() {
        let mut vectors = WordVectors::new(1);
        assert!(vectors.insert("a".to_string(), &[1.0]).unwrap());
        assert!(!vectors.insert("a".to_string(), &[2.0]).unwrap());
        assert_eq!(vectors.vector_of("a"), Some(&[1.0][..]));
        assert_eq!(vectors.len(), 1);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let result = WordVectors::from_entries(3, [("a", vec![1.0, 2.0])]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_with_capacity_bounded_reservation() {
        let vectors = WordVectors::with_capacity(300, usize::MAX);
        assert!(vectors.values.capacity() <= MAX_RESERVED_VALUES);
        assert!(vectors.is_empty());

        let vectors = WordVectors::with_capacity(usize::MAX, usize::MAX);
        assert_eq!(vectors.values.capacity(), 0);
    }

    #[test]
    fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.txt");
        std::fs::write(&path, "toy 1 0\nstory 0 1\n").unwrap();

        let vectors = WordVectors::load(&path, EmbeddingFormat::Text, None).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.dimensions(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = WordVectors::load(dir.path().join("missing.bin"), EmbeddingFormat::Binary, None);
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
