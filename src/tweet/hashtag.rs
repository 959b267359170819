//! Hashtag normalization.
//!
//! Hashtags cannot contain spaces, so multi-word tags are joined in
//! CamelCase to stay readable (`machine learning` becomes
//! `#MachineLearning`).

use std::collections::HashSet;

/// Normalize a raw tag into a `#CamelCase` hashtag.
///
/// The input is split on every non-alphanumeric character (spaces,
/// hyphens, underscores, a leading `#`, ...). Each part gets its first
/// letter uppercased; the rest of the part is kept as written, so acronyms
/// such as `AI` survive. Returns an empty string when nothing alphanumeric
/// remains.
pub fn normalize(raw: &str) -> String {
    let body: String = raw
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize_first)
        .collect();

    if body.is_empty() {
        String::new()
    } else {
        format!("#{}", body)
    }
}

/// Normalize every tag, dropping empties and duplicates.
///
/// Duplicates are detected case-insensitively; the first spelling seen is
/// the one kept.
pub fn normalize_all<I, S>(raw_tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw_tags
        .into_iter()
        .map(|tag| normalize(tag.as_ref()))
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
