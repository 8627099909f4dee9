//! Error types for notice construction and rendering.

use nt_config::ValidationError;
use nt_redact::{CleaningError, PredicateError};
use thiserror::Error;

/// Result type for notice operations.
pub type Result<T> = std::result::Result<T, NoticeError>;

/// Errors surfaced to callers of `build`, `is_ignored` and `render`.
///
/// Context extraction failures are not here: they are recovered during
/// construction and recorded as diagnostics on the notice.
#[derive(Error, Debug)]
pub enum NoticeError {
    /// A filter predicate failed while sanitizing a bag
    #[error("parameter cleaning failed: {0}")]
    Cleaning(#[from] CleaningError),

    /// An ignore predicate failed while deciding suppression
    #[error("ignore rule '{rule}' failed: {source}")]
    Suppression {
        rule: String,
        #[source]
        source: PredicateError,
    },

    /// The notice could not be rendered
    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    /// Settings could not be turned into a configuration
    #[error("configuration error: {0}")]
    Config(#[from] ValidationError),
}

/// Errors raised while rendering a notice to a wire format.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML writer error
    #[error("XML error: {0}")]
    Xml(String),

    /// A string holds characters the XML document cannot carry
    #[error("field '{field}' contains characters that cannot be represented in XML")]
    UnrepresentableText { field: String },
}
