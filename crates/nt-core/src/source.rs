//! Input sources for notice construction.
//!
//! A notice draws its fields from up to three kinds of source, each with its
//! own accessor contract:
//!
//! | kind       | provides                                                        |
//! |------------|-----------------------------------------------------------------|
//! | `Explicit` | every field, as supplied by the caller                          |
//! | `Error`    | class (type name), message, exception class, backtrace          |
//! | `Context`  | url, parameters, session, request metadata, current user        |
//!
//! Per field, the first source in precedence order that yields a value wins.

use nt_backtrace::{capture_current_skipping, RawFrame};
use nt_redact::{to_bag, ParamsBag};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{OnceCell, RefCell};
use tracing::warn;

use crate::context::{ContextResult, RequestContext};

/// Metadata keys that may carry an extra list of parameter names to filter.
pub const PARAMETER_FILTER_KEYS: &[&str] = &["action_dispatch.parameter_filter", "parameter_filter"];

/// The short name of a type: its last path segment, without generics.
///
/// `my_app::errors::Timeout<u8>` becomes `Timeout`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Fields supplied directly by the caller.
///
/// Every field is optional; unset fields are resolved from the other sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeFields {
    pub error_class: Option<String>,
    pub error_message: Option<String>,
    pub exception_classes: Vec<String>,
    pub backtrace: Option<Vec<RawFrame>>,
    pub parameters: Option<Value>,
    pub component: Option<String>,
    pub action: Option<String>,
    pub cgi_data: Option<Value>,
    #[serde(alias = "session")]
    pub session_data: Option<Value>,
    pub url: Option<String>,
    #[serde(alias = "current_user")]
    pub user: Option<Value>,
}

/// An error object attached to the occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// Runtime type name of the error.
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub backtrace: Option<Vec<RawFrame>>,
}

impl ErrorSource {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            backtrace: None,
        }
    }

    /// Describe a Rust error by its short type name and display message.
    ///
    /// Pass the concrete error type: a trait object only reports `Error`.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }

    pub fn with_backtrace(mut self, frames: Vec<RawFrame>) -> Self {
        self.backtrace = Some(frames);
        self
    }

    /// Attach the current execution stack.
    pub fn with_current_stack(self) -> Self {
        let frames = capture_current_skipping(&["nt_core::source"]);
        self.with_backtrace(frames)
    }
}

/// The kind of a [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Explicit,
    Error,
    Context,
}

/// Request context wrapped for best-effort extraction.
///
/// Accessor failures become diagnostics; metadata is fetched at most once
/// because both the CGI bag and filter augmentation read it.
pub struct ContextSource<'a> {
    context: &'a dyn RequestContext,
    metadata: OnceCell<Option<ParamsBag>>,
    diagnostics: RefCell<Vec<String>>,
}

impl<'a> ContextSource<'a> {
    pub fn new(context: &'a dyn RequestContext) -> Self {
        Self {
            context,
            metadata: OnceCell::new(),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    fn extract<T>(&self, result: ContextResult<T>) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    accessor = err.accessor,
                    error = %err.message,
                    "Request context extraction failed"
                );
                self.diagnostics.borrow_mut().push(err.to_string());
                None
            }
        }
    }

    fn metadata(&self) -> Option<&ParamsBag> {
        self.metadata
            .get_or_init(|| self.extract(self.context.metadata()))
            .as_ref()
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.borrow().clone()
    }
}

/// One input source.
pub enum Source<'a> {
    Explicit(&'a NoticeFields),
    Error(&'a ErrorSource),
    Context(ContextSource<'a>),
}

impl<'a> Source<'a> {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Explicit(_) => SourceKind::Explicit,
            Source::Error(_) => SourceKind::Error,
            Source::Context(_) => SourceKind::Context,
        }
    }

    pub fn error_class(&self) -> Option<String> {
        match self {
            Source::Explicit(fields) => fields.error_class.clone(),
            Source::Error(error) => Some(error.type_name.clone()),
            Source::Context(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            Source::Explicit(fields) => fields.error_message.clone(),
            Source::Error(error) => Some(error.message.clone()),
            Source::Context(_) => None,
        }
    }

    pub fn exception_classes(&self) -> Vec<String> {
        match self {
            Source::Explicit(fields) => fields.exception_classes.clone(),
            Source::Error(error) => vec![error.type_name.clone()],
            Source::Context(_) => Vec::new(),
        }
    }

    pub fn backtrace(&self) -> Option<Vec<RawFrame>> {
        match self {
            Source::Explicit(fields) => fields.backtrace.clone(),
            Source::Error(error) => error.backtrace.clone(),
            Source::Context(_) => None,
        }
    }

    pub fn parameters(&self) -> Option<ParamsBag> {
        match self {
            Source::Explicit(fields) => fields.parameters.as_ref().and_then(to_bag),
            Source::Error(_) => None,
            Source::Context(ctx) => ctx
                .extract(ctx.context.parameters())
                .as_ref()
                .and_then(to_bag),
        }
    }

    /// Explicit CGI data counts only when it converts to a bag.
    pub fn cgi_data(&self) -> Option<ParamsBag> {
        match self {
            Source::Explicit(fields) => fields.cgi_data.as_ref().and_then(to_bag),
            Source::Error(_) => None,
            Source::Context(ctx) => ctx.metadata().cloned(),
        }
    }

    pub fn session_data(&self) -> Option<ParamsBag> {
        match self {
            Source::Explicit(fields) => fields.session_data.as_ref().and_then(to_bag),
            Source::Error(_) => None,
            Source::Context(ctx) => ctx.extract(ctx.context.session()).as_ref().and_then(to_bag),
        }
    }

    pub fn url(&self) -> Option<String> {
        match self {
            Source::Explicit(fields) => fields.url.clone(),
            Source::Error(_) => None,
            Source::Context(ctx) => ctx.extract(ctx.context.url()),
        }
    }

    pub fn current_user(&self) -> Option<ParamsBag> {
        match self {
            Source::Explicit(fields) => fields.user.as_ref().and_then(to_bag),
            Source::Error(_) => None,
            Source::Context(ctx) => ctx
                .extract(ctx.context.current_user())
                .as_ref()
                .and_then(to_bag),
        }
    }

    pub fn component(&self) -> Option<String> {
        match self {
            Source::Explicit(fields) => fields.component.clone(),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<String> {
        match self {
            Source::Explicit(fields) => fields.action.clone(),
            _ => None,
        }
    }

    /// Extra parameter names to filter, embedded in request metadata.
    pub fn parameter_filters(&self) -> Vec<String> {
        let Source::Context(ctx) = self else {
            return Vec::new();
        };
        let Some(metadata) = ctx.metadata() else {
            return Vec::new();
        };

        PARAMETER_FILTER_KEYS
            .iter()
            .filter_map(|key| metadata.get(*key))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}

/// The sources of one build, in precedence order.
pub(crate) struct Sources<'a> {
    sources: Vec<Source<'a>>,
}

impl<'a> Sources<'a> {
    pub(crate) fn new(
        fields: &'a NoticeFields,
        error: Option<&'a ErrorSource>,
        context: Option<&'a dyn RequestContext>,
    ) -> Self {
        let mut sources = vec![Source::Explicit(fields)];
        if let Some(error) = error {
            sources.push(Source::Error(error));
        }
        if let Some(context) = context {
            sources.push(Source::Context(ContextSource::new(context)));
        }
        Self { sources }
    }

    /// First value in precedence order.
    pub(crate) fn first<T>(&self, accessor: impl Fn(&Source<'a>) -> Option<T>) -> Option<T> {
        self.sources.iter().find_map(accessor)
    }

    /// First value, visiting kinds in the given order instead.
    pub(crate) fn first_by<T>(
        &self,
        order: &[SourceKind],
        accessor: impl Fn(&Source<'a>) -> Option<T>,
    ) -> Option<T> {
        order.iter().find_map(|kind| {
            self.sources
                .iter()
                .filter(|source| source.kind() == *kind)
                .find_map(&accessor)
        })
    }

    /// Values from every source, concatenated in precedence order.
    pub(crate) fn all<T>(&self, accessor: impl Fn(&Source<'a>) -> Vec<T>) -> Vec<T> {
        self.sources.iter().flat_map(accessor).collect()
    }

    pub(crate) fn diagnostics(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter_map(|source| match source {
                Source::Context(ctx) => Some(ctx.diagnostics()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextError, StaticRequestContext};
    use serde_json::json;
    use std::cell::Cell;

    #[derive(Debug)]
    struct PaymentDeclined;

    impl std::fmt::Display for PaymentDeclined {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "card declined")
        }
    }

    impl std::error::Error for PaymentDeclined {}

    struct CountingContext {
        metadata_calls: Cell<usize>,
    }

    impl RequestContext for CountingContext {
        fn metadata(&self) -> ContextResult<ParamsBag> {
            self.metadata_calls.set(self.metadata_calls.get() + 1);
            Ok(to_bag(&json!({"parameter_filter": ["card_number", 7]})))
        }

        fn session(&self) -> ContextResult<Value> {
            Err(ContextError::new("session", "cookie store unavailable"))
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<PaymentDeclined>(), "PaymentDeclined");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
    }

    #[test]
    fn test_error_source_from_error() {
        let source = ErrorSource::from_error(&PaymentDeclined);
        assert_eq!(source.type_name, "PaymentDeclined");
        assert_eq!(source.message, "card declined");
        assert!(source.backtrace.is_none());
    }

    #[test]
    fn test_explicit_beats_context() {
        let fields = NoticeFields {
            url: Some("https://explicit.example/".to_string()),
            ..NoticeFields::default()
        };
        let ctx = StaticRequestContext {
            url: Some("https://context.example/".to_string()),
            parameters: Some(json!({"id": 1})),
            ..StaticRequestContext::default()
        };
        let sources = Sources::new(&fields, None, Some(&ctx));
        assert_eq!(
            sources.first(Source::url).as_deref(),
            Some("https://explicit.example/")
        );
        assert_eq!(sources.first(Source::parameters).unwrap()["id"], 1);
    }

    #[test]
    fn test_first_by_custom_order() {
        let fields = NoticeFields {
            backtrace: Some(vec![RawFrame::from("explicit.rs:1")]),
            ..NoticeFields::default()
        };
        let error = ErrorSource::new("Boom", "").with_backtrace(vec![RawFrame::from("error.rs:2")]);
        let sources = Sources::new(&fields, Some(&error), None);

        let trace = sources
            .first_by(&[SourceKind::Error, SourceKind::Explicit], Source::backtrace)
            .unwrap();
        assert_eq!(trace, vec![RawFrame::from("error.rs:2")]);
    }

    #[test]
    fn test_context_failures_become_diagnostics() {
        let ctx = CountingContext {
            metadata_calls: Cell::new(0),
        };
        let fields = NoticeFields::default();
        let sources = Sources::new(&fields, None, Some(&ctx));

        assert!(sources.first(Source::session_data).is_none());
        assert_eq!(
            sources.diagnostics(),
            vec!["session unavailable: cookie store unavailable".to_string()]
        );
    }

    #[test]
    fn test_metadata_fetched_once() {
        let ctx = CountingContext {
            metadata_calls: Cell::new(0),
        };
        let fields = NoticeFields::default();
        let sources = Sources::new(&fields, None, Some(&ctx));

        assert!(sources.first(Source::cgi_data).is_some());
        assert_eq!(sources.all(Source::parameter_filters), vec!["card_number"]);
        assert_eq!(ctx.metadata_calls.get(), 1);
    }

    #[test]
    fn test_explicit_cgi_must_be_a_bag() {
        let fields = NoticeFields {
            cgi_data: Some(json!("not a bag")),
            ..NoticeFields::default()
        };
        let ctx = StaticRequestContext {
            metadata: to_bag(&json!({"HTTP_HOST": "example.com"})),
            ..StaticRequestContext::default()
        };
        let sources = Sources::new(&fields, None, Some(&ctx));
        assert_eq!(sources.first(Source::cgi_data).unwrap()["HTTP_HOST"], "example.com");
    }

    #[test]
    fn test_fields_deserialize_aliases() {
        let fields: NoticeFields = serde_json::from_value(json!({
            "error_class": "RuntimeError",
            "session": {"user_id": 1},
            "current_user": {"id": 5},
            "backtrace": ["app.rb:3:in 'run'", {"file": "lib.rs", "number": 9}]
        }))
        .unwrap();
        assert_eq!(fields.session_data, Some(json!({"user_id": 1})));
        assert_eq!(fields.user, Some(json!({"id": 5})));
        assert_eq!(fields.backtrace.map(|b| b.len()), Some(2));
    }
}
