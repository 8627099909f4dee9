//! JSON input documents for the `render` command.
//!
//! ```json
//! {
//!   "fields":  { "error_class": "RuntimeError", "parameters": {"id": 1} },
//!   "error":   { "type": "Timeout", "message": "took too long", "backtrace": ["app.rb:3"] },
//!   "request": { "url": "https://example.com/", "metadata": {"HTTP_HOST": "example.com"} }
//! }
//! ```
//!
//! Every section is optional.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::builder::build;
use crate::config::Configuration;
use crate::context::{RequestContext, StaticRequestContext};
use crate::notice::Notice;
use crate::source::{ErrorSource, NoticeFields};

/// An occurrence described as data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputDocument {
    pub fields: NoticeFields,
    pub error: Option<ErrorSource>,
    pub request: Option<StaticRequestContext>,
}

impl InputDocument {
    /// Read a document from a file, or from stdin when `path` is `-`.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let content = if path == Path::new("-") {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(path)?
        };
        serde_json::from_str(&content).map_err(std::io::Error::from)
    }

    /// Build the notice this document describes.
    pub fn build(&self, config: &Configuration) -> crate::Result<Notice> {
        build(
            config,
            &self.fields,
            self.error.as_ref(),
            self.request.as_ref().map(|ctx| ctx as &dyn RequestContext),
        )
    }
}
