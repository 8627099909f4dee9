//! Error notice core library.
//!
//! This library turns an error occurrence into a sanitized, immutable
//! [`Notice`] and renders it for the ingestion service:
//! - Runtime configuration and ignore rules
//! - Request-context adapter and input sources
//! - Notice construction with field precedence
//! - XML and JSON rendering
//! - Exit codes and logging for the CLI
//!
//! The binary entry point is in `main.rs`.
//!
//! # Example
//!
//! ```
//! use nt_core::{build, render, Configuration, NoticeFields, PayloadFormat};
//!
//! let config = Configuration::default();
//! let fields = NoticeFields {
//!     error_class: Some("RuntimeError".to_string()),
//!     error_message: Some("boom".to_string()),
//!     ..NoticeFields::default()
//! };
//!
//! let notice = build(&config, &fields, None, None).unwrap();
//! assert_eq!(notice.error_message(), "RuntimeError: boom");
//!
//! let payload = render(&notice, PayloadFormat::Json).unwrap();
//! assert_eq!(payload.content_type(), "application/json");
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod input;
pub mod logging;
pub mod notice;
pub mod render;
pub mod source;

pub use builder::{build, NoticeBuilder};
pub use config::{Configuration, IgnorePredicate, IgnoreRule};
pub use context::{ContextError, ContextResult, RequestContext, StaticRequestContext};
pub use error::{NoticeError, Result, SerializationError};
pub use notice::{Notice, NoticeField, FIELD_NAMES, REQUEST_KEY};
pub use render::{render, Payload, PayloadFormat};
pub use source::{short_type_name, ErrorSource, NoticeFields, Source, SourceKind};
