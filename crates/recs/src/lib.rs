//! # Bookshelf Recs
//!
//! Personalized book recommendations via item-item collaborative filtering:
//! a sparse, user-mean-centered rating matrix over ISBNs, an exact cosine
//! nearest-neighbor index over its item rows, and per-user aggregation of
//! neighbor similarities into one ranked list.
//!
//! Training is an offline batch (the `recs-trainer` binary) that rebuilds
//! the matrix and index wholesale and atomically replaces a persisted
//! artifact bundle. Querying is read-only against a loaded bundle via
//! [`ModelHandle`] and is safe to share across threads.

pub mod error;
pub mod extract;
pub mod handle;
pub mod index;
pub mod matrix;
pub mod recommend;
pub mod sparse;
pub mod store;
pub mod trainer;

// Re-export key types
pub use error::{RecsError, Result};
pub use extract::BookCatalog;
pub use handle::ModelHandle;
pub use index::{CosineIndex, Neighbor};
pub use matrix::{ItemMapping, MatrixBuilder, RatingMatrix};
pub use recommend::{recommend_for_user, Recommendation, RecommendationResponse};
pub use sparse::CsrMatrix;
pub use store::{ArtifactStore, Manifest, RecommenderModel};
pub use trainer::TrainingRun;
