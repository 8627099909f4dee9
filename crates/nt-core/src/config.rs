//! Runtime configuration handed to the notice builder.
//!
//! A [`Configuration`] is a read-only snapshot. Builds borrow it and never
//! modify it, so one value (typically behind an `Arc`) serves any number of
//! concurrent builds.

use nt_backtrace::{Frame, FilterChain};
use nt_config::{validate_settings, NotifierIdentity, NotifierSettings, ValidationError};
use nt_redact::{FilterRule, PredicateError, RuleSpec};
use std::fmt;
use std::sync::Arc;

use crate::notice::Notice;
use crate::source::short_type_name;

/// A suppression predicate over a fully-built notice.
pub type IgnorePredicate =
    Arc<dyn Fn(&Notice) -> std::result::Result<bool, PredicateError> + Send + Sync>;

/// A condition under which a notice is not reported.
#[derive(Clone)]
pub enum IgnoreRule {
    /// Matches when any contributing exception class has this name.
    Class(String),
    /// Matches when the predicate returns true for the notice.
    Predicate {
        name: String,
        predicate: IgnorePredicate,
    },
}

impl IgnoreRule {
    /// Ignore by class name.
    pub fn class_name(name: impl Into<String>) -> Self {
        IgnoreRule::Class(name.into())
    }

    /// Ignore by Rust type, normalized to its short type name.
    pub fn class<E: ?Sized>() -> Self {
        IgnoreRule::Class(short_type_name::<E>())
    }

    /// Ignore by predicate.
    pub fn predicate<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Notice) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        IgnoreRule::Predicate {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            IgnoreRule::Class(name) => format!("class:{}", name),
            IgnoreRule::Predicate { name, .. } => format!("predicate:{}", name),
        }
    }
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IgnoreRule({})", self.describe())
    }
}

/// Everything the builder needs from the outside world.
#[derive(Clone)]
pub struct Configuration {
    pub api_key: Option<String>,
    pub environment_name: String,
    pub project_root: Option<String>,
    pub notifier: NotifierIdentity,

    /// Blacklist rules.
    pub params_filters: Vec<FilterRule>,

    /// Whitelist rules; when non-empty the blacklist is not consulted.
    pub params_whitelist_filters: Vec<FilterRule>,

    pub ignore: Vec<IgnoreRule>,

    /// Rules tested against the cleaned `HTTP_USER_AGENT` value.
    pub ignore_user_agent: Vec<FilterRule>,

    pub development_environments: Vec<String>,

    /// Filters applied to every parsed frame.
    pub backtrace_filters: FilterChain,

    /// Capture the current stack when neither the error nor the fields carry
    /// a trace.
    pub capture_current_stack: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api_key: None,
            environment_name: "production".to_string(),
            project_root: None,
            notifier: NotifierIdentity::default(),
            params_filters: Vec::new(),
            params_whitelist_filters: Vec::new(),
            ignore: Vec::new(),
            ignore_user_agent: Vec::new(),
            development_environments: vec!["development".to_string(), "test".to_string()],
            backtrace_filters: FilterChain::new(),
            capture_current_stack: false,
        }
    }
}

impl Configuration {
    /// Build a runtime configuration from validated settings.
    pub fn from_settings(settings: &NotifierSettings) -> std::result::Result<Self, ValidationError> {
        validate_settings(settings)?;

        let backtrace_filters = if settings.use_default_backtrace_filters {
            FilterChain::with_defaults(settings.project_root.as_deref())
        } else {
            FilterChain::new()
        };

        Ok(Self {
            api_key: settings.api_key.clone(),
            environment_name: settings.environment_name.clone(),
            project_root: settings.project_root.clone(),
            notifier: settings.notifier.clone(),
            params_filters: compile_rules("params_filters", &settings.params_filters)?,
            params_whitelist_filters: compile_rules(
                "params_whitelist_filters",
                &settings.params_whitelist_filters,
            )?,
            ignore: settings
                .ignore
                .iter()
                .map(|name| IgnoreRule::class_name(name.clone()))
                .collect(),
            ignore_user_agent: compile_rules("ignore_user_agent", &settings.ignore_user_agent)?,
            development_environments: settings.development_environments.clone(),
            backtrace_filters,
            capture_current_stack: false,
        })
    }

    /// Whether notices from this environment should be delivered.
    pub fn is_public(&self) -> bool {
        !self
            .development_environments
            .iter()
            .any(|env| env == &self.environment_name)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_environment(mut self, name: impl Into<String>) -> Self {
        self.environment_name = name.into();
        self
    }

    /// Add a blacklist rule.
    pub fn with_params_filter(mut self, rule: impl Into<FilterRule>) -> Self {
        self.params_filters.push(rule.into());
        self
    }

    /// Add a whitelist rule.
    pub fn with_whitelist_filter(mut self, rule: impl Into<FilterRule>) -> Self {
        self.params_whitelist_filters.push(rule.into());
        self
    }

    pub fn with_ignore(mut self, rule: IgnoreRule) -> Self {
        self.ignore.push(rule);
        self
    }

    pub fn with_ignore_user_agent(mut self, rule: impl Into<FilterRule>) -> Self {
        self.ignore_user_agent.push(rule.into());
        self
    }

    /// Append a frame filter to the backtrace chain.
    pub fn with_backtrace_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Frame) -> Option<Frame> + Send + Sync + 'static,
    {
        self.backtrace_filters.push(filter);
        self
    }

    pub fn with_stack_capture(mut self, enabled: bool) -> Self {
        self.capture_current_stack = enabled;
        self
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("environment_name", &self.environment_name)
            .field("project_root", &self.project_root)
            .field("notifier", &self.notifier)
            .field("params_filters", &self.params_filters)
            .field("params_whitelist_filters", &self.params_whitelist_filters)
            .field("ignore", &self.ignore)
            .field("ignore_user_agent", &self.ignore_user_agent)
            .field("development_environments", &self.development_environments)
            .field("backtrace_filters", &self.backtrace_filters)
            .field("capture_current_stack", &self.capture_current_stack)
            .finish()
    }
}

fn compile_rules(
    field: &str,
    specs: &[RuleSpec],
) -> std::result::Result<Vec<FilterRule>, ValidationError> {
    RuleSpec::compile_all(specs).map_err(|e| ValidationError::InvalidValue {
        field: field.to_string(),
        message: e.to_string(),
    })
}
