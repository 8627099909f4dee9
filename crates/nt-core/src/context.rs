//! Request-context adapter.
//!
//! The surrounding framework's request and session objects are consumed only
//! through [`RequestContext`]. Every accessor is best-effort: a failure is
//! reported as a [`ContextError`], which the builder turns into an empty value
//! plus a diagnostic on the notice.

use nt_redact::ParamsBag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A failed context extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{accessor} unavailable: {message}")]
pub struct ContextError {
    /// Name of the accessor that failed (`url`, `parameters`, ...).
    pub accessor: &'static str,
    pub message: String,
}

impl ContextError {
    pub fn new(accessor: &'static str, message: impl Into<String>) -> Self {
        Self {
            accessor,
            message: message.into(),
        }
    }
}

/// Result of a context accessor: a value, nothing, or a failure.
pub type ContextResult<T> = std::result::Result<Option<T>, ContextError>;

/// Read interface over the request an error occurred in.
///
/// Every accessor defaults to "nothing available".
pub trait RequestContext {
    /// The request URL.
    fn url(&self) -> ContextResult<String> {
        Ok(None)
    }

    /// Structured request parameters.
    fn parameters(&self) -> ContextResult<Value> {
        Ok(None)
    }

    /// Session contents.
    fn session(&self) -> ContextResult<Value> {
        Ok(None)
    }

    /// Raw request metadata (CGI variables, framework env entries).
    fn metadata(&self) -> ContextResult<ParamsBag> {
        Ok(None)
    }

    /// The signed-in user, if any.
    fn current_user(&self) -> ContextResult<Value> {
        Ok(None)
    }
}

/// A request context backed by plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRequestContext {
    pub url: Option<String>,
    pub parameters: Option<Value>,
    pub session: Option<Value>,
    pub metadata: Option<ParamsBag>,
    pub current_user: Option<Value>,
}

impl RequestContext for StaticRequestContext {
    fn url(&self) -> ContextResult<String> {
        Ok(self.url.clone())
    }

    fn parameters(&self) -> ContextResult<Value> {
        Ok(self.parameters.clone())
    }

    fn session(&self) -> ContextResult<Value> {
        Ok(self.session.clone())
    }

    fn metadata(&self) -> ContextResult<ParamsBag> {
        Ok(self.metadata.clone())
    }

    fn current_user(&self) -> ContextResult<Value> {
        Ok(self.current_user.clone())
    }
}
