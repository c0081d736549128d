//! Builder for Drive search query strings.
//!
//! See the `q` parameter of the Drive v3 `files.list` endpoint. Clauses are
//! joined with `and`; literal values are single-quoted and escaped.

use crate::models::CLASSIFIED_KEY;

/// An `and`-joined list of search clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to direct children of a folder.
    pub fn in_folder(mut self, folder_id: &str) -> Self {
        self.clauses.push(format!("{} in parents", quote(folder_id)));
        self
    }

    /// Restrict to any of the given MIME types. Blank entries are ignored and
    /// an empty list adds no restriction.
    pub fn mime_types<S: AsRef<str>>(mut self, mime_types: &[S]) -> Self {
        if let Some(clause) = mime_type_clause(mime_types) {
            self.clauses.push(format!("({})", clause));
        }
        self
    }

    /// Only documents the classifier has processed.
    pub fn classified(mut self) -> Self {
        self.clauses.push(classified_clause());
        self
    }

    /// Only documents the classifier has not processed yet.
    pub fn not_classified(mut self) -> Self {
        self.clauses.push(format!("not {}", classified_clause()));
        self
    }

    /// Modified at or after `timestamp`.
    pub fn modified_since(mut self, timestamp: &str) -> Self {
        self.clauses
            .push(format!("modifiedTime >= {}", quote(timestamp)));
        self
    }

    /// Modified at or before `timestamp`.
    pub fn modified_until(mut self, timestamp: &str) -> Self {
        self.clauses
            .push(format!("modifiedTime <= {}", quote(timestamp)));
        self
    }

    /// The final query string, or `None` when no clause was added.
    pub fn build(&self) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses.join(" and "))
        }
    }
}

/// `mimeType = 'a' or mimeType = 'b'`, without surrounding parentheses.
pub fn mime_type_clause<S: AsRef<str>>(mime_types: &[S]) -> Option<String> {
    let parts: Vec<String> = mime_types
        .iter()
        .map(|m| m.as_ref().trim())
        .filter(|m| !m.is_empty())
        .map(|m| format!("mimeType = {}", quote(m)))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" or "))
    }
}

fn classified_clause() -> String {
    format!(
        "properties has {{ key='{}' and value='true' }}",
        CLASSIFIED_KEY
    )
}

/// Quote a literal, escaping backslashes and single quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
