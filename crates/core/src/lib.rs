//! # Bookshelf Core
//!
//! Shared building blocks for the Bookshelf reading platform: domain models
//! for books and reading interactions, error types, configuration loading,
//! validation utilities, and logging setup.
//!
//! ## Modules
//!
//! - `models`: Domain models for books, library records, and interactions
//! - `error`: Error types and handling
//! - `config`: Configuration loading and validation
//! - `validation`: Validation utilities and regex patterns
//! - `observability`: Structured logging initialization

pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod validation;

// Re-export commonly used types
pub use config::{load_dotenv, ArtifactConfig, ConfigLoader, QueryConfig, TrainingConfig};
pub use error::{BookshelfError, Result};
pub use models::{Book, Interaction, LibraryRecord, Provenance, ReadingStatus};
