//! Notice construction.
//!
//! Field precedence, per field: explicit fields > error object > request
//! context > computed default > empty. The error class and the backtrace are
//! the exceptions: an attached error object's type name and trace win over
//! explicit values.
//!
//! Sanitization runs once, after every bag is resolved; nothing unsanitized
//! reaches the returned [`Notice`].

use nt_backtrace::{capture_current_skipping, parse, RawFrame};
use nt_redact::{FilterRule, ParamsBag, ParamsCleaner};
use serde_json::Value;
use tracing::debug;

use crate::config::Configuration;
use crate::context::RequestContext;
use crate::notice::Notice;
use crate::source::{ErrorSource, NoticeFields, Source, SourceKind, Sources};
use crate::Result;

/// Message used when no source supplies one.
pub const DEFAULT_ERROR_MESSAGE: &str = "Notification";

/// Keys of the user-info bag that are kept.
pub const USER_KEYS: &[&str] = &["id", "name", "email", "username"];

/// Kinds visited for the error class and backtrace.
const ERROR_FIRST: &[SourceKind] = &[SourceKind::Error, SourceKind::Explicit];

/// Session wrappers nest their contents under this key.
const SESSION_DATA_KEY: &str = "data";

/// Build a notice from caller fields, an optional error and an optional
/// request context.
///
/// Context extraction failures are recorded on the notice as diagnostics.
/// Cleaning failures are returned as errors.
pub fn build(
    config: &Configuration,
    fields: &NoticeFields,
    error: Option<&ErrorSource>,
    context: Option<&dyn RequestContext>,
) -> Result<Notice> {
    let sources = Sources::new(fields, error, context);

    let error_class = sources.first_by(ERROR_FIRST, Source::error_class);
    let raw_message = sources.first(Source::error_message);
    let error_message = compose_message(error_class.as_deref(), raw_message.as_deref());

    let mut exception_classes = sources.all(Source::exception_classes);
    exception_classes.extend(error_class.iter().cloned());
    if let Some(explicit) = &fields.error_class {
        if error_class.as_ref() != Some(explicit) {
            exception_classes.push(explicit.clone());
        }
    }

    let raw_trace: Vec<RawFrame> = match sources.first_by(ERROR_FIRST, Source::backtrace) {
        Some(trace) => trace,
        None if config.capture_current_stack => capture_current_skipping(&[module_path!()]),
        None => Vec::new(),
    };
    let backtrace = parse(&raw_trace, &config.backtrace_filters);

    let parameters = sources.first(Source::parameters).unwrap_or_default();
    let cgi_data = sources.first(Source::cgi_data).unwrap_or_default();
    let session_data = sources
        .first(Source::session_data)
        .map(unwrap_session_data)
        .unwrap_or_default();
    let url = sources.first(Source::url);
    let user = sources
        .first(Source::current_user)
        .map(restrict_user)
        .unwrap_or_default();

    let mut blacklist = config.params_filters.clone();
    let extra_filters = sources.all(Source::parameter_filters);
    if !extra_filters.is_empty() {
        debug!(
            count = extra_filters.len(),
            "Adding parameter filters from request metadata"
        );
        blacklist.extend(extra_filters.into_iter().map(FilterRule::Key));
    }

    let component = sources
        .first(Source::component)
        .or_else(|| text_entry(&parameters, "controller"));
    let action = sources
        .first(Source::action)
        .or_else(|| text_entry(&parameters, "action"));

    let cleaner = ParamsCleaner::new(&blacklist, &config.params_whitelist_filters);
    let bags = cleaner.clean_all(&parameters, &cgi_data, &session_data)?;
    let url = url.map(|url| cleaner.clean_url(&url)).transpose()?;
    let current_user = cleaner.clean_bag(&user)?;

    let hostname = hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().to_string());

    let notice = Notice {
        api_key: config.api_key.clone(),
        error_class,
        error_message,
        exception_classes,
        backtrace,
        parameters: bags.parameters,
        cgi_data: bags.cgi_data,
        session_data: bags.session_data,
        component,
        action,
        url,
        hostname,
        project_root: config.project_root.clone(),
        environment_name: config.environment_name.clone(),
        notifier: config.notifier.clone(),
        current_user,
        ignore: config.ignore.clone(),
        ignore_user_agent: config.ignore_user_agent.clone(),
        diagnostics: sources.diagnostics(),
    };

    debug!(
        error_class = ?notice.error_class(),
        frames = notice.backtrace().len(),
        diagnostics = notice.diagnostics().len(),
        "Built notice"
    );

    Ok(notice)
}

fn compose_message(class: Option<&str>, raw: Option<&str>) -> String {
    match (class, raw) {
        (Some(class), Some(raw)) => format!("{}: {}", class, raw),
        (None, Some(raw)) => raw.to_string(),
        (_, None) => DEFAULT_ERROR_MESSAGE.to_string(),
    }
}

/// Unwrap one level when the session nests its contents under `data`.
fn unwrap_session_data(session: ParamsBag) -> ParamsBag {
    match session.get(SESSION_DATA_KEY) {
        Some(Value::Object(inner)) => inner.clone(),
        _ => session,
    }
}

fn restrict_user(user: ParamsBag) -> ParamsBag {
    user.into_iter()
        .filter(|(key, value)| {
            USER_KEYS.contains(&key.as_str()) && !value.is_object() && !value.is_array()
        })
        .collect()
}

fn text_entry(bag: &ParamsBag, key: &str) -> Option<String> {
    bag.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Fluent front end for [`build`].
pub struct NoticeBuilder<'a> {
    config: &'a Configuration,
    fields: NoticeFields,
    error: Option<ErrorSource>,
    context: Option<&'a dyn RequestContext>,
}

impl<'a> NoticeBuilder<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            fields: NoticeFields::default(),
            error: None,
            context: None,
        }
    }

    /// Replace all explicit fields.
    pub fn fields(mut self, fields: NoticeFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn error_class(mut self, class: impl Into<String>) -> Self {
        self.fields.error_class = Some(class.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.fields.error_message = Some(message.into());
        self
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.fields.parameters = Some(parameters);
        self
    }

    pub fn backtrace(mut self, frames: Vec<RawFrame>) -> Self {
        self.fields.backtrace = Some(frames);
        self
    }

    pub fn error(mut self, error: ErrorSource) -> Self {
        self.error = Some(error);
        self
    }

    /// Attach a Rust error by its short type name and message.
    pub fn from_error<E: std::error::Error + ?Sized>(self, error: &E) -> Self {
        self.error(ErrorSource::from_error(error))
    }

    pub fn context(mut self, context: &'a dyn RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn build(&self) -> Result<Notice> {
        build(self.config, &self.fields, self.error.as_ref(), self.context)
    }
}
