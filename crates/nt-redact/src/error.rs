//! Error types for parameter cleaning.

use thiserror::Error;

/// Result type for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Error raised by a user-supplied rule predicate.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while cleaning parameter bags.
///
/// Messages carry rule names and key paths only, never parameter values.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// A filter predicate failed while testing a key.
    #[error("filter rule {rule} failed on key '{key_path}': {source}")]
    Predicate {
        rule: String,
        key_path: String,
        #[source]
        source: PredicateError,
    },

    /// A pattern rule could not be compiled.
    #[error("invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl CleaningError {
    /// The key path at which cleaning stopped, if any.
    pub fn key_path(&self) -> Option<&str> {
        match self {
            CleaningError::Predicate { key_path, .. } => Some(key_path),
            CleaningError::InvalidPattern { .. } => None,
        }
    }
}
