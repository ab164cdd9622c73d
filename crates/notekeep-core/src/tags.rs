//! Tag name normalization.
//!
//! Tags arrive from a single free-text field ("Work, Planning") and are
//! stored per user under a lowercase name. Every code path that turns user
//! input into tag names goes through this module so the store never sees
//! two spellings of the same tag.

use std::collections::HashSet;

/// Separator between tag names in the raw input field.
pub const TAG_SEPARATOR: char = ',';

/// Normalize a single tag name: trim surrounding whitespace and lowercase.
///
/// Used for tag filters where the input is one name rather than a list.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse a comma-separated tag string into normalized tag names.
///
/// Entries are trimmed, empties dropped, and names lowercased. Duplicates
/// collapse to the first occurrence, so the result keeps the order in which
/// the user typed them.
///
/// # Examples
///
/// ```
/// use notekeep_core::normalize_tags;
///
/// assert_eq!(normalize_tags("Work, work, Planning "), vec!["work", "planning"]);
/// assert!(normalize_tags(" , ,").is_empty());
/// ```
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(TAG_SEPARATOR)
        .map(normalize_tag_name)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
