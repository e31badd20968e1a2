use std::io::{BufRead, Read};

use super::WordVectors;
use crate::error::{AppError, AppResult};

/// Reads the word2vec binary format
///
/// An ASCII `<count> <dims>` header line is followed by `count` entries, each
/// the word bytes, a single space, then `dims` little-endian `f32`s. Entries
/// may be separated by a newline.
pub fn read_binary<R: BufRead>(mut reader: R, limit: Option<usize>) -> AppResult<WordVectors> {
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let (count, dimensions) = parse_header(&header)?;
    let entry_bytes = dimensions
        .checked_mul(4)
        .filter(|_| count.checked_mul(dimensions).is_some())
        .ok_or_else(|| {
            AppError::MalformedInput(format!(
                "word2vec header '{}' declares more values than fit in memory",
                header.trim()
            ))
        })?;

    // The header is not trusted for sizing; buffers grow with the data read
    let wanted = limit.map_or(count, |limit| limit.min(count));
    let mut vectors = WordVectors::with_capacity(dimensions, wanted);

    let mut word = Vec::new();
    let mut raw = Vec::new();
    let mut vector = Vec::new();

    for entry in 0..wanted {
        word.clear();
        reader.read_until(b' ', &mut word)?;
        if word.pop() != Some(b' ') {
            return Err(truncated(entry));
        }

        raw.clear();
        (&mut reader).take(entry_bytes as u64).read_to_end(&mut raw)?;
        if raw.len() != entry_bytes {
            return Err(truncated(entry));
        }

        vector.clear();
        vector.extend(
            raw.chunks_exact(4)
                .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        );
        if vector.iter().any(|value| !value.is_finite()) {
            return Err(AppError::MalformedInput(format!(
                "word2vec entry {} has a non-finite value",
                entry
            )));
        }

        let start = word.iter().position(|b| *b != b'\n').unwrap_or(word.len());
        let text = String::from_utf8_lossy(&word[start..]).into_owned();
        vectors.insert(text, &vector)?;
    }

    Ok(vectors)
}

fn parse_header(line: &str) -> AppResult<(usize, usize)> {
    let mut parts = line.split_whitespace().map(str::parse::<usize>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(count)), Some(Ok(dimensions)), None) if dimensions > 0 => Ok((count, dimensions)),
        _ => Err(AppError::MalformedInput(format!(
            "invalid word2vec header '{}'",
            line.trim()
        ))),
    }
}

fn truncated(entry: usize) -> AppError {
    AppError::MalformedInput(format!("word2vec file truncated at entry {}", entry))
}
