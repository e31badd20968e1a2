use std::path::PathBuf;

use serde::Deserialize;

use crate::services::embeddings::EmbeddingFormat;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Movies table (movieId, title, genres)
    #[serde(default = "default_movies_path")]
    pub movies_path: PathBuf,

    /// Tags table (movieId, tag, ...)
    #[serde(default = "default_tags_path")]
    pub tags_path: PathBuf,

    /// Pretrained word vectors
    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: PathBuf,

    /// On-disk layout of the word vectors
    #[serde(default)]
    pub embeddings_format: EmbeddingFormat,

    /// Load at most this many words from the embeddings file
    #[serde(default)]
    pub embeddings_limit: Option<usize>,

    /// Number of recommendations returned per query
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_movies_path() -> PathBuf {
    PathBuf::from("data/movies.csv")
}

fn default_tags_path() -> PathBuf {
    PathBuf::from("data/tags.csv")
}

fn default_embeddings_path() -> PathBuf {
    PathBuf::from("data/GoogleNews-vectors-negative300.bin")
}

fn default_top_n() -> usize {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
