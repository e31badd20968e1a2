pub mod embeddings;
pub mod feature_composer;
pub mod metadata_loader;
pub mod recommendations;
pub mod similarity;
pub mod vectorizer;

pub use embeddings::{EmbeddingFormat, EmbeddingLookup, WordVectors};
pub use recommendations::Recommender;
pub use similarity::{build_similarity_matrix, cosine_similarity, SimilarityMatrix};
