//! Error types shared across the Bookshelf platform crates.

pub type Result<T> = std::result::Result<T, BookshelfError>;

#[derive(Debug, thiserror::Error)]
pub enum BookshelfError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error on `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BookshelfError {
    /// Configuration error with a free-form message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Validation error tied to a named field.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
