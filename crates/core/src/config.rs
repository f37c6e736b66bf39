//! Configuration loading for the Bookshelf platform.
//!
//! Environment-variable driven configuration with typed values, `.env` file
//! support via dotenvy, and validation with clear error messages. All
//! variables use the `BOOKSHELF_` prefix. Defaults match the production
//! training setup; CLI flags may override loaded values.
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_core::config::{load_dotenv, ConfigLoader, TrainingConfig};
//!
//! load_dotenv();
//! let config = TrainingConfig::from_env()?;
//! config.validate()?;
//! # Ok::<(), bookshelf_core::BookshelfError>(())
//! ```

use crate::error::BookshelfError;
use std::path::PathBuf;
use std::str::FromStr;

/// Load a `.env` file if one is present. Missing files are not an error.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Configuration loader trait
///
/// Standardized methods for loading and validating configuration from
/// environment variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from `BOOKSHELF_`-prefixed environment variables,
    /// applying defaults for missing optional values.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a variable is set but cannot be
    /// parsed into its typed value.
    fn from_env() -> Result<Self, BookshelfError>;

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if any value is outside its acceptable
    /// range.
    fn validate(&self) -> Result<(), BookshelfError>;
}

fn env_parsed<T: FromStr>(name: &str, default: T) -> Result<T, BookshelfError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| {
            BookshelfError::configuration(format!("{name} has an unparseable value: {raw:?}"))
        }),
        Err(_) => Ok(default),
    }
}

/// Offline training configuration.
///
/// # Environment Variables
///
/// - `BOOKSHELF_MIN_USER_RATINGS` (optional): minimum interactions a user
///   needs to survive popularity filtering (default: 20)
/// - `BOOKSHELF_MIN_ITEM_RATINGS` (optional): minimum interactions an item
///   needs to survive popularity filtering (default: 10)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingConfig {
    /// Users with fewer interactions than this are dropped
    pub min_user_ratings: usize,
    /// Items with fewer interactions than this are dropped
    pub min_item_ratings: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_user_ratings: 20,
            min_item_ratings: 10,
        }
    }
}

impl ConfigLoader for TrainingConfig {
    fn from_env() -> Result<Self, BookshelfError> {
        let defaults = Self::default();
        Ok(Self {
            min_user_ratings: env_parsed("BOOKSHELF_MIN_USER_RATINGS", defaults.min_user_ratings)?,
            min_item_ratings: env_parsed("BOOKSHELF_MIN_ITEM_RATINGS", defaults.min_item_ratings)?,
        })
    }

    fn validate(&self) -> Result<(), BookshelfError> {
        if self.min_user_ratings == 0 {
            return Err(BookshelfError::configuration(
                "BOOKSHELF_MIN_USER_RATINGS must be at least 1",
            ));
        }
        if self.min_item_ratings == 0 {
            return Err(BookshelfError::configuration(
                "BOOKSHELF_MIN_ITEM_RATINGS must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Query-time recommendation configuration.
///
/// # Environment Variables
///
/// - `BOOKSHELF_TOP_N` (optional): ranked list length (default: 12)
/// - `BOOKSHELF_NEIGHBOR_BREADTH` (optional): nearest items fetched per known
///   item during aggregation (default: 30)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Maximum number of recommendations returned
    pub top_n: usize,
    /// Neighbors retrieved per known item
    pub neighbor_breadth: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_n: 12,
            neighbor_breadth: 30,
        }
    }
}

impl ConfigLoader for QueryConfig {
    fn from_env() -> Result<Self, BookshelfError> {
        let defaults = Self::default();
        Ok(Self {
            top_n: env_parsed("BOOKSHELF_TOP_N", defaults.top_n)?,
            neighbor_breadth: env_parsed("BOOKSHELF_NEIGHBOR_BREADTH", defaults.neighbor_breadth)?,
        })
    }

    fn validate(&self) -> Result<(), BookshelfError> {
        if self.top_n == 0 {
            return Err(BookshelfError::configuration(
                "BOOKSHELF_TOP_N must be at least 1",
            ));
        }
        if self.neighbor_breadth == 0 {
            return Err(BookshelfError::configuration(
                "BOOKSHELF_NEIGHBOR_BREADTH must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Artifact bundle location.
///
/// # Environment Variables
///
/// - `BOOKSHELF_ARTIFACT_DIR` (optional): directory holding the persisted
///   model bundle (default: `artifacts`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactConfig {
    /// Directory the trainer writes to and the query path loads from
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

impl ConfigLoader for ArtifactConfig {
    fn from_env() -> Result<Self, BookshelfError> {
        let dir = std::env::var("BOOKSHELF_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default().dir);
        Ok(Self { dir })
    }

    fn validate(&self) -> Result<(), BookshelfError> {
        if self.dir.as_os_str().is_empty() {
            return Err(BookshelfError::configuration(
                "BOOKSHELF_ARTIFACT_DIR must not be empty",
            ));
        }
        Ok(())
    }
}
