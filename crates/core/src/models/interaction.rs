//! Reading interaction models.
//!
//! A [`LibraryRecord`] is what the application's record-keeping layer exports
//! for each (user, book) pair: a reading state plus an optional explicit
//! journal rating on a 0-5 scale. An [`Interaction`] is the unified long-form
//! rating triple the training pipeline works with, on the external dataset's
//! 1-10 scale.

use serde::{Deserialize, Serialize};

/// Where a rating triple came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Bulk external rating dataset
    ExternalDataset,
    /// Explicit journal rating entered by an app user
    ExplicitJournal,
    /// Rating inferred from the record's reading state
    InferredFromState,
}

/// Reading state of a library record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Pending,
    Started,
    InProgress,
    Finished,
    Abandoned,
}

impl ReadingStatus {
    /// Rating inferred from the reading state when no explicit rating exists,
    /// on the external dataset's 1-10 scale. `Pending` carries no signal and
    /// maps to `None`.
    pub fn inferred_rating(self) -> Option<f32> {
        match self {
            ReadingStatus::Pending => None,
            ReadingStatus::Started => Some(6.0),
            ReadingStatus::InProgress => Some(7.0),
            ReadingStatus::Finished => Some(9.0),
            ReadingStatus::Abandoned => Some(3.0),
        }
    }
}

/// Per-user library record exported by the application layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryRecord {
    /// Opaque application user identifier (un-namespaced)
    pub user_id: String,
    /// ISBN of the book this record tracks
    pub isbn: String,
    /// Current reading state
    pub status: ReadingStatus,
    /// Explicit journal rating on a 0-5 scale, if the user entered one
    #[serde(default)]
    pub rating: Option<f32>,
}

/// A unified (user, item, rating) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub isbn: String,
    /// Rating on the external dataset's 1-10 scale, always > 0
    pub rating: f32,
    pub provenance: Provenance,
}

impl Interaction {
    pub fn new(
        user_id: impl Into<String>,
        isbn: impl Into<String>,
        rating: f32,
        provenance: Provenance,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            isbn: isbn.into(),
            rating,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inferred_rating_per_status() {
        assert_eq!(ReadingStatus::Pending.inferred_rating(), None);
        assert_eq!(ReadingStatus::Started.inferred_rating(), Some(6.0));
        assert_eq!(ReadingStatus::InProgress.inferred_rating(), Some(7.0));
        assert_eq!(ReadingStatus::Finished.inferred_rating(), Some(9.0));
        assert_eq!(ReadingStatus::Abandoned.inferred_rating(), Some(3.0));
    }

    #[test]
    fn test_library_record_deserializes_snake_case_status() {
        let json = r#"{"user_id":"42","isbn":"0451526538","status":"in_progress"}"#;
        let record: LibraryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, ReadingStatus::InProgress);
        assert_eq!(record.rating, None);
    }
}
