//! Identifier and title formatting for column names

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static NON_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").unwrap());

static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9_]*").unwrap());

/// Format a string as an identifier
///
/// Keeps `[a-zA-Z0-9_]`, drops leading digits and underscores, lowercases.
pub fn format_short_name(s: &str) -> String {
    let s = NON_IDENTIFIER.replace_all(s, "");
    let s = LEADING_DIGITS.replace(&s, "");
    s.to_lowercase().trim().to_string()
}

/// Format a string as a title
pub fn format_long_name(s: &str) -> String {
    s.trim().to_string()
}

/// Identifiers for a list of titles, unique within the list
///
/// Titles that sanitize to nothing become `column_<n>` (1-based position);
/// repeats get a numeric suffix.
pub fn unique_identifiers(titles: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let base = match format_short_name(title) {
                s if s.is_empty() => format!("column_{}", i + 1),
                s => s,
            };
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}
