use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use csv::StringRecord;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, MovieRecord, MovieRow, TagRow},
};

const MOVIE_COLUMNS: [&str; 3] = ["movieId", "title", "genres"];
const TAG_COLUMNS: [&str; 2] = ["movieId", "tag"];

/// Loads movie records from the movies and tags tables on disk
pub fn load_movies_from_path(
    movies_path: impl AsRef<Path>,
    tags_path: impl AsRef<Path>,
) -> AppResult<Vec<MovieRecord>> {
    let movies = File::open(movies_path.as_ref())?;
    let tags = File::open(tags_path.as_ref())?;
    load_movies(movies, tags)
}

/// Builds one `MovieRecord` per distinct movie id in the movies table
///
/// The movies table is the base of the join: tags that reference an unknown
/// movie are dropped, and movies without tags keep an empty tag set.
#[tracing::instrument(skip_all)]
pub fn load_movies<M: Read, T: Read>(movies: M, tags: T) -> AppResult<Vec<MovieRecord>> {
    let start = Instant::now();

    let mut records = read_movies(movies)?;
    let positions: HashMap<MovieId, usize> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| (record.movie_id, idx))
        .collect();

    let mut reader = csv::Reader::from_reader(tags);
    require_columns(reader.headers()?, &TAG_COLUMNS, "tags")?;

    let mut tag_rows = 0usize;
    let mut orphan_tags = 0usize;
    for row in reader.deserialize::<TagRow>() {
        let row = row?;
        let Some(tag) = row.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        tag_rows += 1;

        match positions.get(&row.movie_id) {
            Some(&idx) => records[idx].add_tag(tag),
            None => orphan_tags += 1,
        }
    }

    let untagged = records.iter().filter(|r| r.tags.is_empty()).count();
    tracing::info!(
        movies = records.len(),
        tag_rows,
        orphan_tags,
        untagged,
        processing_time_ms = start.elapsed().as_millis(),
        "Metadata loaded"
    );

    Ok(records)
}

fn read_movies<R: Read>(source: R) -> AppResult<Vec<MovieRecord>> {
    let mut reader = csv::Reader::from_reader(source);
    require_columns(reader.headers()?, &MOVIE_COLUMNS, "movies")?;

    let mut records: Vec<MovieRecord> = Vec::new();
    let mut seen: HashSet<MovieId> = HashSet::new();

    for row in reader.deserialize::<MovieRow>() {
        let row = row?;
        if !seen.insert(row.movie_id) {
            tracing::warn!(movie_id = row.movie_id, "Duplicate movie id, keeping first row");
            continue;
        }
        records.push(MovieRecord::new(
            row.movie_id,
            normalize_title(&row.title),
            split_genres(&row.genres),
        ));
    }

    Ok(records)
}

fn require_columns(headers: &StringRecord, expected: &[&str], table: &str) -> AppResult<()> {
    for column in expected {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(AppError::MalformedInput(format!(
                "{} table is missing column '{}'",
                table, column
            )));
        }
    }
    Ok(())
}

/// Strips one pair of wrapping double quotes and a trailing ` (YYYY)` year
///
/// The quotes may wrap either the whole title or only the part before the
/// year, so they are checked again once the year is gone.
pub fn normalize_title(raw: &str) -> String {
    let title = raw.trim();
    let (title, unquoted) = match strip_wrapping_quotes(title) {
        Some(inner) => (inner, true),
        None => (title, false),
    };

    let title = strip_year_suffix(title).unwrap_or(title);
    let title = if unquoted {
        title
    } else {
        strip_wrapping_quotes(title).unwrap_or(title)
    };

    title.trim().to_string()
}

fn strip_wrapping_quotes(s: &str) -> Option<&str> {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn strip_year_suffix(s: &str) -> Option<&str> {
    // " (YYYY)" is seven ASCII bytes
    let bytes = s.as_bytes();
    if bytes.len() < 7 {
        return None;
    }
    let tail = &bytes[bytes.len() - 7..];
    let is_year = tail[0] == b' '
        && tail[1] == b'('
        && tail[2..6].iter().all(u8::is_ascii_digit)
        && tail[6] == b')';

    is_year.then(|| &s[..s.len() - 7])
}

/// Splits a `|`-separated genre list, keeping source order
pub fn split_genres(raw: &str) -> Vec<String> {
    raw.replace('|', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
