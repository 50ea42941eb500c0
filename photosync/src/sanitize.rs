use std::collections::HashMap;

use deunicode::deunicode;
use percent_encoding::percent_decode_str;

pub const UNTITLED: &str = "untitled";

/// Turn a remote title into a file name and URI safe slug. Return an empty
/// string when nothing usable remains, callers substitute [`UNTITLED`].
pub fn sanitize(title: &str) -> String {
    let title = title
        .strip_suffix(".jpg")
        .or_else(|| title.strip_suffix(".JPG"))
        .unwrap_or(title);
    let decoded = percent_decode_str(title).decode_utf8_lossy();
    let ascii = deunicode(&decoded).to_lowercase();

    let mut replaced = String::with_capacity(ascii.len());
    for character in ascii.chars() {
        match character {
            '@' => replaced.push_str("at"),
            '&' => replaced.push_str("and"),
            '*' => replaced.push_str("star"),
            '\'' => {}
            'a'..='z' | '0'..='9' | '_' | '[' | ']' | '-' => replaced.push(character),
            _ => replaced.push(' '),
        }
    }

    replaced
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .trim_end_matches('.')
        .replace(' ', "_")
}

/// Memoized [`sanitize`]. Entries are never invalidated: the function is pure.
#[derive(Debug, Default)]
pub struct NameSanitizer {
    cache: HashMap<String, String>,
}

impl NameSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sanitize(&mut self, title: &str) -> String {
        if let Some(slug) = self.cache.get(title) {
            return slug.clone();
        }

        let slug = sanitize(title);
        self.cache.insert(title.to_string(), slug.clone());
        slug
    }

    /// Slug for given title, or [`UNTITLED`]
    pub fn slug(&mut self, title: &str) -> String {
        let slug = self.sanitize(title);
        if slug.is_empty() {
            UNTITLED.to_string()
        } else {
            slug
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
