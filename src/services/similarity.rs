use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;

use crate::{
    error::{AppError, AppResult},
    models::EmbeddingVector,
};

/// Cosine similarity, defined as 0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    similarity_with_norms(a, b, norm(a), norm(b))
}

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

fn similarity_with_norms(a: &[f32], b: &[f32], norm_a: f64, norm_b: f64) -> f32 {
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let score = (dot / denom) as f32;
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Dense pairwise cosine similarities between all movie vectors
///
/// Row and column order follow the input vector order. The matrix is exactly
/// symmetric; the diagonal is 1.0 for non-zero vectors and 0.0 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.scores[i * self.size + j]
    }

    /// Similarities of row `i` against every movie
    pub fn row(&self, i: usize) -> &[f32] {
        &self.scores[i * self.size..(i + 1) * self.size]
    }

    /// Indices of the `top_n` rows most similar to `row`, best first
    ///
    /// The row itself is never returned. Equal scores keep table order.
    pub fn most_similar(&self, row: usize, top_n: usize) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self
            .row(row)
            .iter()
            .copied()
            .enumerate()
            .filter(|(idx, _)| *idx != row)
            .collect();

        // sort_by is stable, so ties stay in table order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(top_n);
        ranked
    }
}

/// Builds the full similarity matrix
///
/// Every vector must have the same dimensionality.
pub fn build_similarity_matrix(vectors: &[EmbeddingVector]) -> AppResult<SimilarityMatrix> {
    let start = Instant::now();
    let size = vectors.len();

    if let Some(first) = vectors.first() {
        let dims = first.dimensions();
        if let Some((idx, v)) = vectors.iter().enumerate().find(|(_, v)| v.dimensions() != dims) {
            return Err(AppError::InvalidInput(format!(
                "vector {} has {} dimensions, expected {}",
                idx,
                v.dimensions(),
                dims
            )));
        }
    }

    let norms: Vec<f64> = vectors.iter().map(|v| norm(v.as_slice())).collect();
    let mut scores = vec![0f32; size * size];

    if size > 0 {
        scores
            .par_chunks_mut(size)
            .enumerate()
            .for_each(|(i, row)| {
                for (j, score) in row.iter_mut().enumerate() {
                    *score = if i == j {
                        if norms[i] > 0.0 {
                            1.0
                        } else {
                            0.0
                        }
                    } else {
                        similarity_with_norms(
                            vectors[i].as_slice(),
                            vectors[j].as_slice(),
                            norms[i],
                            norms[j],
                        )
                    };
                }
            });
    }

    tracing::info!(
        movies = size,
        processing_time_ms = start.elapsed().as_millis(),
        "Similarity matrix built"
    );

    Ok(SimilarityMatrix { size, scores })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(raw: &[&[f32]]) -> Vec<EmbeddingVector> {
        raw.iter().map(|v| EmbeddingVector(v.to_vec())).collect()
    }

    #[test]
    fn test_cosine_identical() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let vs = vectors(&[&[1.0, 2.0, 0.5], &[0.3, -1.0, 2.0], &[4.0, 4.0, 4.0], &[-0.1, 0.2, 9.0]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        assert_eq!(matrix.len(), 4);
        for i in 0..4 {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn test_matrix_zero_vector_row() {
        let vs = vectors(&[&[1.0, 0.0], &[0.0, 0.0], &[0.5, 0.5]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        assert_eq!(matrix.row(1), &[0.0, 0.0, 0.0]);
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(2, 1), 0.0);
    }

    #[test]
    fn test_matrix_rejects_mixed_dimensions() {
        let vs = vectors(&[&[1.0, 0.0], &[1.0]]);
        let result = build_similarity_matrix(&vs);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_matrix_scores_always_finite() {
        let vs = vectors(&[&[1.0, 0.0], &[f32::NAN, 1.0], &[f32::INFINITY, 1.0], &[0.5, 0.5]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        for i in 0..4 {
            assert!(matrix.row(i).iter().all(|s| s.is_finite()));
        }
        assert_eq!(matrix.most_similar(0, 3)[0].0, 3);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = build_similarity_matrix(&[]).unwrap();
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_most_similar_orders_and_excludes_self() {
        let vs = vectors(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 0.1], &[1.0, 1.0]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        let ranked = matrix.most_similar(0, 10);
        let indices: Vec<usize> = ranked.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(indices, vec![2, 3, 1]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_most_similar_ties_keep_table_order() {
        // Rows 1..=3 are identical, so they tie against row 0
        let vs = vectors(&[&[1.0, 0.0], &[1.0, 1.0], &[1.0, 1.0], &[1.0, 1.0]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        let indices: Vec<usize> = matrix.most_similar(0, 3).iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_most_similar_duplicate_of_query_still_excludes_self() {
        // Row 0 and row 1 are identical, both score 1.0 against each other
        let vs = vectors(&[&[1.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        let indices: Vec<usize> = matrix.most_similar(1, 5).iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_most_similar_limits() {
        let vs = vectors(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
        let matrix = build_similarity_matrix(&vs).unwrap();

        assert!(matrix.most_similar(0, 0).is_empty());
        assert_eq!(matrix.most_similar(0, 1).len(), 1);
        assert_eq!(matrix.most_similar(0, 100).len(), 2);
    }
}
