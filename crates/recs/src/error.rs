//! Error types for the recommendation engine.
//!
//! Only conditions that stop a caller are errors. Two taxonomy members are
//! deliberately *not* errors: a query referencing an item absent from the
//! trained mapping is skipped (partial signal is still useful), and a user
//! with no resolvable known items gets an explicit
//! [`RecommendationResponse::NoSignal`](crate::recommend::RecommendationResponse)
//! so the presentation layer can distinguish it from an empty ranked list.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RecsError>;

#[derive(Debug, thiserror::Error)]
pub enum RecsError {
    /// Popularity filtering left an empty matrix. Surfaced to the training
    /// operator as a hard stop; no artifacts are replaced.
    #[error("insufficient data after filtering: {0}")]
    DataInsufficient(String),

    /// No artifact bundle exists at the configured location. Fatal to the
    /// query path (service unavailable).
    #[error("artifact bundle missing at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// The bundle exists but cannot be trusted: a file fails to deserialize,
    /// the per-file version stamps disagree, or row alignment is broken.
    /// Fatal to the query path.
    #[error("artifact bundle corrupt: {0}")]
    ArtifactCorrupt(String),

    /// An input file is structurally unusable (missing header columns,
    /// unreadable container). Individual malformed rows are skipped instead.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
