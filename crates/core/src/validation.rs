//! Validation utilities for Bookshelf data structures.
//!
//! Provides validation functions and regex patterns for identifiers crossing
//! the application boundary. Bulk dataset rows are normalized rather than
//! validated: a malformed row is skipped by the extractor, never fatal.

use crate::error::BookshelfError;
use once_cell::sync::Lazy;
use regex::Regex;

/// ISBN-like identifier: digits, letters, and hyphens, up to 32 chars.
/// Deliberately permissive; bulk rating datasets carry pre-ISBN and
/// malformed-but-linkable identifiers that still join against the catalog.
pub static ISBN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z-]{1,32}$").expect("Failed to compile ISBN regex"));

/// Application user identifiers: non-empty, no whitespace, up to 64 chars.
pub static USER_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S{1,64}$").expect("Failed to compile user id regex"));

/// Normalize a raw item identifier: trim surrounding whitespace and reject
/// empty results. Rows whose identifier normalizes to `None` carry no
/// linkable signal.
pub fn normalize_isbn(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validate an ISBN-like identifier from the application boundary.
///
/// # Examples
///
/// ```
/// use bookshelf_core::validation::validate_isbn;
///
/// assert!(validate_isbn("0451526538").is_ok());
/// assert!(validate_isbn("978-0451526538").is_ok());
/// assert!(validate_isbn("").is_err());
/// ```
pub fn validate_isbn(isbn: &str) -> Result<(), BookshelfError> {
    if ISBN_REGEX.is_match(isbn) {
        Ok(())
    } else {
        Err(BookshelfError::validation_field(
            "Invalid ISBN format (expected 1-32 alphanumeric characters or hyphens)",
            "isbn",
        ))
    }
}

/// Validate an application user identifier.
pub fn validate_user_id(user_id: &str) -> Result<(), BookshelfError> {
    if USER_ID_REGEX.is_match(user_id) {
        Ok(())
    } else {
        Err(BookshelfError::validation_field(
            "Invalid user id (expected non-empty, no whitespace)",
            "user_id",
        ))
    }
}

/// Validate an explicit journal rating on the application's 0-5 scale.
pub fn validate_journal_rating(rating: f32) -> Result<(), BookshelfError> {
    if (0.0..=5.0).contains(&rating) && rating.is_finite() {
        Ok(())
    } else {
        Err(BookshelfError::validation_field(
            "Journal rating must be between 0 and 5",
            "rating",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_isbn_trims_and_rejects_empty() {
        assert_eq!(normalize_isbn("  0451526538 "), Some("0451526538".into()));
        assert_eq!(normalize_isbn("   "), None);
        assert_eq!(normalize_isbn(""), None);
    }

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("0451526538").is_ok());
        assert!(validate_isbn("043935806X").is_ok());
        assert!(validate_isbn("978-0451526538").is_ok());
        assert!(validate_isbn("").is_err());
        assert!(validate_isbn("isbn with spaces").is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("276725").is_ok());
        assert!(validate_user_id("app_42").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("user 42").is_err());
    }

    #[test]
    fn test_validate_journal_rating_bounds() {
        assert!(validate_journal_rating(0.0).is_ok());
        assert!(validate_journal_rating(5.0).is_ok());
        assert!(validate_journal_rating(5.5).is_err());
        assert!(validate_journal_rating(-1.0).is_err());
        assert!(validate_journal_rating(f32::NAN).is_err());
    }
}
