//! Book catalog models.

use serde::{Deserialize, Serialize};

/// Placeholder used when catalog metadata cannot be resolved for an ISBN.
/// Metadata is always a concrete string, never absent.
pub const UNKNOWN_METADATA: &str = "Unknown";

/// A catalog entry keyed by ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// ISBN-like identifier, as it appears in interaction records
    pub isbn: String,
    /// Book title
    pub title: String,
    /// Primary author
    pub author: String,
}

impl Book {
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
        }
    }

    /// Placeholder entry for an ISBN with no resolvable catalog metadata.
    pub fn unresolved(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            title: UNKNOWN_METADATA.to_string(),
            author: UNKNOWN_METADATA.to_string(),
        }
    }
}
