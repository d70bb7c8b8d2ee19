// src/findlib/fields.rs

//! Parsing of findlib query output

use regex::Regex;
use std::sync::LazyLock;

static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s,]+").expect("list separator regex is valid")
});

/// Split a comma and/or whitespace separated field, dropping empty entries
pub fn split_list(field: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(field)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a whitespace separated field
pub fn split_words(field: &str) -> Vec<String> {
    field.split_whitespace().map(str::to_string).collect()
}

/// Extract package names from `ocamlfind list` output
///
/// Each entry looks like `name   (version: 1.2.3)`; names never contain
/// whitespace, and version strings never contain `)`.
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .split(')')
        .filter_map(|entry| entry.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Join a base predicate string with an extra predicate
pub fn add_predicate(base: &str, extra: &str) -> String {
    if base.is_empty() {
        extra.to_string()
    } else {
        format!("{},{}", base, extra)
    }
}
