//! Wire rendering of notices.
//!
//! Both formats carry the same logical fields:
//!
//! | field               | XML                                   | JSON                  |
//! |---------------------|---------------------------------------|-----------------------|
//! | api key             | `<api-key>`                           | `apiKey`              |
//! | notifier            | `<notifier>` name/version/url         | `notifier`            |
//! | error class/message | `<error>` class/message               | `error`               |
//! | frames              | `<error><backtrace><line …/>`         | `backtrace[]`         |
//! | request             | `<request>` url/component/action/bags | `request`             |
//! | server environment  | `<server-environment>`                | `serverEnvironment`   |
//! | user                | `<current-user>`                      | `currentUser`         |
//!
//! Absent values are omitted from XML and rendered as `null` / `{}` / `[]`
//! in JSON.

mod json;
mod xml;

use crate::error::SerializationError;
use crate::notice::Notice;
use tracing::debug;

pub use json::render_json;
pub use xml::{render_xml, XML_API_VERSION};

/// Output format of a rendered notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// Notifier API XML document.
    #[default]
    Xml,
    /// JSON object.
    Json,
}

impl PayloadFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            PayloadFormat::Xml => "text/xml; charset=utf-8",
            PayloadFormat::Json => "application/json",
        }
    }
}

impl std::str::FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" => Ok(PayloadFormat::Xml),
            "json" => Ok(PayloadFormat::Json),
            _ => Err(format!("unknown payload format: {}", s)),
        }
    }
}

impl std::fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadFormat::Xml => write!(f, "xml"),
            PayloadFormat::Json => write!(f, "json"),
        }
    }
}

/// A rendered notice, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub format: PayloadFormat,
    pub body: String,
}

impl Payload {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Render a notice in the given format.
pub fn render(notice: &Notice, format: PayloadFormat) -> Result<Payload, SerializationError> {
    let body = match format {
        PayloadFormat::Xml => render_xml(notice)?,
        PayloadFormat::Json => render_json(notice)?,
    };
    debug!(format = %format, bytes = body.len(), "Rendered notice");
    Ok(Payload { format, body })
}
