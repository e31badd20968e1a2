use std::time::Instant;

use rayon::prelude::*;

use crate::{models::EmbeddingVector, services::embeddings::EmbeddingLookup};

/// Averages the embeddings of the in-vocabulary tokens of `text`
///
/// Out-of-vocabulary tokens are skipped. When nothing is left the zero vector
/// of the lookup's dimensionality is returned.
pub fn vectorize(text: &str, embeddings: &dyn EmbeddingLookup) -> EmbeddingVector {
    let mut sum = vec![0f32; embeddings.dimensions()];
    let mut matched = 0usize;

    for vector in text
        .split_whitespace()
        .filter_map(|token| embeddings.vector_of(token))
    {
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += value;
        }
        matched += 1;
    }

    if matched == 0 {
        return EmbeddingVector::zeros(embeddings.dimensions());
    }

    let count = matched as f32;
    for acc in sum.iter_mut() {
        *acc /= count;
    }
    EmbeddingVector(sum)
}

/// Vectorizes every text, preserving input order
pub fn vectorize_all(texts: &[String], embeddings: &dyn EmbeddingLookup) -> Vec<EmbeddingVector> {
    let start = Instant::now();

    let vectors: Vec<EmbeddingVector> = texts
        .par_iter()
        .map(|text| vectorize(text, embeddings))
        .collect();

    let zero_vectors = vectors.iter().filter(|v| v.is_zero()).count();
    if zero_vectors > 0 {
        tracing::warn!(
            zero_vectors,
            "Some movies have no in-vocabulary tokens and use the zero vector"
        );
    }
    tracing::info!(
        movies = vectors.len(),
        dimensions = embeddings.dimensions(),
        processing_time_ms = start.elapsed().as_millis(),
        "Feature texts vectorized"
    );

    vectors
}
