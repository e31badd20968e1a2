use std::collections::HashMap;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{EmbeddingVector, MovieId, MovieRecord, Recommendation},
    services::{
        embeddings::EmbeddingLookup,
        feature_composer::{compose_feature_text, normalize_text},
        metadata_loader::normalize_title,
        similarity::{build_similarity_matrix, SimilarityMatrix},
        vectorizer::vectorize_all,
    },
};

/// Content-based recommender over an in-memory movie catalog
///
/// Owns the records, their feature texts and vectors, and the similarity
/// matrix. Everything is computed once in `build` and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Recommender {
    movies: Vec<MovieRecord>,
    positions: HashMap<MovieId, usize>,
    feature_texts: Vec<String>,
    vectors: Vec<EmbeddingVector>,
    matrix: SimilarityMatrix,
}

impl Recommender {
    /// Runs composition, vectorization and matrix construction
    pub fn build(movies: Vec<MovieRecord>, embeddings: &dyn EmbeddingLookup) -> AppResult<Self> {
        let start = Instant::now();

        let feature_texts: Vec<String> = movies.iter().map(compose_feature_text).collect();
        let vectors = vectorize_all(&feature_texts, embeddings);
        let matrix = build_similarity_matrix(&vectors)?;

        let positions = movies
            .iter()
            .enumerate()
            .map(|(idx, movie)| (movie.movie_id, idx))
            .collect();

        tracing::info!(
            movies = movies.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommender ready"
        );

        Ok(Self {
            movies,
            positions,
            feature_texts,
            vectors,
            matrix,
        })
    }

    /// Returns the `top_n` movies most similar to `movie_id`, best first
    ///
    /// The query movie is never part of the result. Fewer than `top_n` items
    /// come back when the catalog is smaller than `top_n + 1`.
    pub fn recommend(&self, movie_id: MovieId, top_n: usize) -> AppResult<Vec<Recommendation>> {
        let row = self.position(movie_id)?;

        let recommendations: Vec<Recommendation> = self
            .matrix
            .most_similar(row, top_n)
            .into_iter()
            .map(|(idx, score)| Recommendation {
                movie_id: self.movies[idx].movie_id,
                title: self.movies[idx].title.clone(),
                score,
            })
            .collect();

        tracing::debug!(
            movie_id,
            top_n,
            returned = recommendations.len(),
            "Recommendations served"
        );

        Ok(recommendations)
    }

    /// Ids of the `top_n` movies most similar to `movie_id`
    pub fn recommend_ids(&self, movie_id: MovieId, top_n: usize) -> AppResult<Vec<MovieId>> {
        Ok(self
            .recommend(movie_id, top_n)?
            .into_iter()
            .map(|r| r.movie_id)
            .collect())
    }

    /// Finds a movie by title, ignoring case and punctuation
    ///
    /// A trailing year is ignored on both sides. The first match in table
    /// order wins; no match is an `InvalidInput` error.
    pub fn find_by_title(&self, title: &str) -> AppResult<MovieId> {
        let wanted = normalize_text(&normalize_title(title));
        if wanted.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "title '{}' has no searchable words",
                title
            )));
        }

        self.movies
            .iter()
            .find(|movie| normalize_text(&movie.title) == wanted)
            .map(|movie| movie.movie_id)
            .ok_or_else(|| AppError::InvalidInput(format!("no movie titled '{}'", title)))
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&MovieRecord> {
        self.positions.get(&movie_id).map(|&idx| &self.movies[idx])
    }

    pub fn feature_text(&self, movie_id: MovieId) -> AppResult<&str> {
        Ok(&self.feature_texts[self.position(movie_id)?])
    }

    pub fn vector(&self, movie_id: MovieId) -> AppResult<&EmbeddingVector> {
        Ok(&self.vectors[self.position(movie_id)?])
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    fn position(&self, movie_id: MovieId) -> AppResult<usize> {
        self.positions
            .get(&movie_id)
            .copied()
            .ok_or(AppError::MovieNotFound(movie_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embeddings::WordVectors;

    fn movie(id: MovieId, title: &str, genres: &[&str], tags: &[&str]) -> MovieRecord {
        let mut record = MovieRecord::new(
            id,
            title.to_string(),
            genres.iter().map(|g| g.to_string()).collect(),
        );
        for tag in tags {
            record.add_tag(tag);
        }
        record
    }

    fn vocabulary() -> WordVectors {
        WordVectors::from_entries(
            3,
            [
                ("animation", vec![1.0, 0.0, 0.0]),
                ("children", vec![0.9, 0.1, 0.0]),
                ("pixar", vec![1.0, 0.2, 0.0]),
                ("horror", vec![0.0, 0.0, 1.0]),
                ("thriller", vec![0.0, 0.3, 1.0]),
                ("drama", vec![0.0, 1.0, 0.0]),
            ],
        )
        .unwrap()
    }

    fn recommender() -> Recommender {
        let movies = vec![
            movie(1, "Toy Story", &["Animation", "Children"], &["pixar"]),
            movie(2, "Halloween", &["Horror"], &[]),
            movie(3, "Toy Story 2", &["Animation", "Children"], &["pixar"]),
            movie(4, "Scream", &["Horror", "Thriller"], &[]),
            movie(5, "Zzyzx", &[], &[]),
            movie(6, "Cars", &["Animation"], &[]),
        ];
        Recommender::build(movies, &vocabulary()).unwrap()
    }

    #[test]
    fn test_recommend_ranks_similar_first() {
        let rec = recommender();
        let ids = rec.recommend_ids(1, 2).unwrap();
        assert_eq!(ids, vec![3, 6]);
    }

    #[test]
    fn test_recommend_excludes_query() {
        let rec = recommender();
        for movie in rec.movies() {
            let ids = rec.recommend_ids(movie.movie_id, 10).unwrap();
            assert!(!ids.contains(&movie.movie_id));
            assert_eq!(ids.len(), rec.movies().len() - 1);
        }
    }

    #[test]
    fn test_recommend_scores_non_increasing() {
        let rec = recommender();
        let recs = rec.recommend(4, 5).unwrap();
        assert_eq!(recs.len(), 5);
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(recs[0].movie_id, 2);
        assert_eq!(recs[0].title, "Halloween");
    }

    #[test]
    fn test_recommend_zero_top_n() {
        let rec = recommender();
        assert!(rec.recommend(1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_recommend_unknown_movie() {
        let rec = recommender();
        let result = rec.recommend(42, 5);
        assert!(matches!(result, Err(AppError::MovieNotFound(42))));
    }

    #[test]
    fn test_zero_vector_movie() {
        let rec = recommender();
        // "zzyzx notags" has no vocabulary match
        assert_eq!(rec.feature_text(5).unwrap(), "zzyzx notags");
        assert!(rec.vector(5).unwrap().is_zero());

        let row = rec.matrix().row(4);
        assert!(row.iter().all(|s| *s == 0.0));

        // All scores tie at zero, so table order decides
        assert_eq!(rec.recommend_ids(5, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_find_by_title() {
        let rec = recommender();
        assert_eq!(rec.find_by_title("toy story").unwrap(), 1);
        assert_eq!(rec.find_by_title("Toy Story 2 (1999)").unwrap(), 3);
        assert_eq!(rec.find_by_title("TOY-STORY").unwrap(), 1);
    }

    #[test]
    fn test_find_by_title_unknown() {
        let rec = recommender();
        assert!(matches!(
            rec.find_by_title("Up"),
            Err(AppError::InvalidInput(msg)) if msg.contains("'Up'")
        ));
        assert!(matches!(rec.find_by_title("!!!"), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_movie_lookup() {
        let rec = recommender();
        assert_eq!(rec.movie(6).map(|m| m.title.as_str()), Some("Cars"));
        assert!(rec.movie(7).is_none());
        assert!(matches!(rec.vector(7), Err(AppError::MovieNotFound(7))));
    }
}
