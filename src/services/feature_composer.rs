use crate::models::MovieRecord;

/// Builds the text blob a movie is embedded from
///
/// Title, genres and tags are normalized separately and joined with single
/// spaces. The result only contains `[a-z0-9 ]`.
pub fn compose_feature_text(record: &MovieRecord) -> String {
    [
        normalize_text(&record.title),
        normalize_text(&record.genre_text()),
        normalize_text(&record.tag_text()),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Lowercases and reduces text to ASCII alphanumeric words
///
/// Hyphens and underscores split words; any other non-alphanumeric character
/// becomes a space; whitespace runs collapse; the ends are trimmed.
pub fn normalize_text(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => ' ',
        })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
