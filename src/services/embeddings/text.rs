use std::io::BufRead;

use super::WordVectors;
use crate::error::{AppError, AppResult};

/// Reads the word2vec / GloVe text format
///
/// Each line is a word followed by its values. A first line holding exactly
/// two integers is a `<count> <dims>` header; without one the dimensionality
/// comes from the first entry.
pub fn read_text<R: BufRead>(reader: R, limit: Option<usize>) -> AppResult<WordVectors> {
    let mut vectors: Option<WordVectors> = None;
    let mut loaded = 0usize;

    let limit_reached = |loaded: usize| limit.is_some_and(|limit| loaded >= limit);

    for (idx, line) in reader.lines().enumerate() {
        // Keep reading until the dimensionality is known, even at a zero limit
        if vectors.is_some() && limit_reached(loaded) {
            break;
        }

        let line = line?;
        let line_no = idx + 1;
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            continue;
        };
        let values: Vec<&str> = parts.collect();

        if idx == 0 {
            if let Some(dimensions) = header_dimensions(word, &values) {
                if dimensions == 0 {
                    return Err(AppError::MalformedInput(
                        "embedding header declares zero dimensions".to_string(),
                    ));
                }
                vectors = Some(WordVectors::new(dimensions));
                continue;
            }
        }

        let vector = values
            .iter()
            .map(|v| v.parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| AppError::MalformedInput(format!("line {}: {}", line_no, e)))?;

        if vector.is_empty() {
            return Err(AppError::MalformedInput(format!(
                "line {}: word '{}' has no values",
                line_no, word
            )));
        }
        if vector.iter().any(|value| !value.is_finite()) {
            return Err(AppError::MalformedInput(format!(
                "line {}: word '{}' has a non-finite value",
                line_no, word
            )));
        }

        let store = vectors.get_or_insert_with(|| WordVectors::new(vector.len()));
        if vector.len() != store.dimensions {
            return Err(AppError::MalformedInput(format!(
                "line {}: expected {} values, found {}",
                line_no,
                store.dimensions,
                vector.len()
            )));
        }
        if limit_reached(loaded) {
            break;
        }

        store.insert(word.to_string(), &vector)?;
        loaded += 1;
    }

    vectors.ok_or_else(|| AppError::MalformedInput("embedding file is empty".to_string()))
}

fn header_dimensions(first: &str, rest: &[&str]) -> Option<usize> {
    match rest {
        [dims] => {
            first.parse::<usize>().ok()?;
            dims.parse::<usize>().ok()
        }
        _ => None,
    }
}
