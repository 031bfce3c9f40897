//! Front matter for markdown posts.
//!
//! A post may open with a header block:
//!
//! ```text
//! ---
//! title: "Hello"
//! date: 2024-03-01
//! tags: travel, film
//! ---
//! # Body starts here
//! ```
//!
//! The grammar is small. Each line is split at its first `:`;
//! key and value are trimmed, and one leading and one trailing quote (`"` or
//! `'`) are removed from the value. Lines without a colon are ignored. A file
//! that does not start with `---`, or never closes the block, has no front
//! matter and is all body.

use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Parsed `key: value` pairs from a post header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: BTreeMap<String, String>,
}

impl FrontMatter {
    /// Raw value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value for `key` when present and non-empty.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// `tags` split on commas, trimmed, blanks dropped.
    pub fn tags(&self) -> Vec<String> {
        self.get("tags")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']) == DELIMITER
}

/// Separate the header block from the body.
///
/// Returns `(Some(header), body)` when the file opens with a closed
/// `---` block, otherwise `(None, source)`.
pub fn split(source: &str) -> (Option<&str>, &str) {
    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, source);
    };
    if !is_delimiter(first) {
        return (None, source);
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if is_delimiter(line) {
            let header = &source[header_start..offset];
            let body = &source[offset + line.len()..];
            return (Some(header), body);
        }
        offset += line.len();
    }
    (None, source)
}

fn strip_quotes(value: &str) -> &str {
    let value = value
        .strip_prefix('"')
        .or_else(|| value.strip_prefix('\''))
        .unwrap_or(value);
    value
        .strip_suffix('"')
        .or_else(|| value.strip_suffix('\''))
        .unwrap_or(value)
}

/// Parse the lines of a header block.
pub fn parse(header: &str) -> FrontMatter {
    let fields = header
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), strip_quotes(value.trim())))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    FrontMatter { fields }
}

/// Split and parse in one step.
pub fn extract(source: &str) -> (FrontMatter, &str) {
    match split(source) {
        (Some(header), body) => (parse(header), body),
        (None, body) => (FrontMatter::default(), body),
    }
}
