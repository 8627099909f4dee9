//! The canonical, immutable record of one error occurrence.

use nt_backtrace::Backtrace;
use nt_config::NotifierIdentity;
use nt_redact::{Cleaned, FilterRule, ParamsBag};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::config::IgnoreRule;
use crate::{NoticeError, Result};

/// Every field name readable through [`Notice::get`].
pub const FIELD_NAMES: &[&str] = &[
    "api_key",
    "error_class",
    "error_message",
    "exception_classes",
    "backtrace",
    "parameters",
    "cgi_data",
    "session_data",
    "component",
    "action",
    "url",
    "hostname",
    "project_root",
    "environment_name",
    "notifier",
    "current_user",
    "diagnostics",
];

/// Reserved key for which [`Notice::get`] returns the notice itself.
pub const REQUEST_KEY: &str = "request";

/// CGI variable tested by user-agent ignore rules.
const USER_AGENT_KEY: &str = "HTTP_USER_AGENT";

/// A field value borrowed from a notice.
#[derive(Debug, Clone, Copy)]
pub enum NoticeField<'a> {
    /// A known field with no value.
    Absent,
    Text(&'a str),
    List(&'a [String]),
    Bag(&'a ParamsBag),
    Backtrace(&'a Backtrace),
    Notifier(&'a NotifierIdentity),
    /// The notice itself, returned for [`REQUEST_KEY`].
    Request(&'a Notice),
}

impl<'a> NoticeField<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            NoticeField::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&'a ParamsBag> {
        match self {
            NoticeField::Bag(bag) => Some(bag),
            _ => None,
        }
    }
}

/// A fully-built, sanitized error notice.
///
/// Notices are created by [`crate::build`] and never change afterwards. The
/// parameter, CGI, session and user bags are only held in cleaned form.
#[derive(Clone)]
pub struct Notice {
    pub(crate) api_key: Option<String>,
    pub(crate) error_class: Option<String>,
    pub(crate) error_message: String,
    pub(crate) exception_classes: Vec<String>,
    pub(crate) backtrace: Backtrace,
    pub(crate) parameters: Cleaned<ParamsBag>,
    pub(crate) cgi_data: Cleaned<ParamsBag>,
    pub(crate) session_data: Cleaned<ParamsBag>,
    pub(crate) component: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) url: Option<Cleaned<String>>,
    pub(crate) hostname: Option<String>,
    pub(crate) project_root: Option<String>,
    pub(crate) environment_name: String,
    pub(crate) notifier: NotifierIdentity,
    pub(crate) current_user: Cleaned<ParamsBag>,
    pub(crate) ignore: Vec<IgnoreRule>,
    pub(crate) ignore_user_agent: Vec<FilterRule>,
    pub(crate) diagnostics: Vec<String>,
}

impl Notice {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn error_class(&self) -> Option<&str> {
        self.error_class.as_deref()
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Every exception class name that contributed to this notice.
    pub fn exception_classes(&self) -> &[String] {
        &self.exception_classes
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn parameters(&self) -> &Cleaned<ParamsBag> {
        &self.parameters
    }

    pub fn cgi_data(&self) -> &Cleaned<ParamsBag> {
        &self.cgi_data
    }

    pub fn session_data(&self) -> &Cleaned<ParamsBag> {
        &self.session_data
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().map(|url| url.as_str())
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn project_root(&self) -> Option<&str> {
        self.project_root.as_deref()
    }

    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    pub fn notifier(&self) -> &NotifierIdentity {
        &self.notifier
    }

    pub fn current_user(&self) -> &Cleaned<ParamsBag> {
        &self.current_user
    }

    /// Context extraction failures recorded during construction.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn ignore_rules(&self) -> &[IgnoreRule] {
        &self.ignore
    }

    /// The cleaned `HTTP_USER_AGENT` CGI value, if it is text.
    pub fn user_agent(&self) -> Option<&str> {
        self.cgi_data.get(USER_AGENT_KEY).and_then(Value::as_str)
    }

    /// Look up a field by name.
    ///
    /// Returns `None` for unknown names and [`NoticeField::Absent`] for known
    /// fields without a value.
    pub fn get(&self, name: &str) -> Option<NoticeField<'_>> {
        let field = match name {
            REQUEST_KEY => NoticeField::Request(self),
            "api_key" => text_field(self.api_key()),
            "error_class" => text_field(self.error_class()),
            "error_message" => NoticeField::Text(&self.error_message),
            "exception_classes" => NoticeField::List(&self.exception_classes),
            "backtrace" => NoticeField::Backtrace(&self.backtrace),
            "parameters" => NoticeField::Bag(&self.parameters),
            "cgi_data" => NoticeField::Bag(&self.cgi_data),
            "session_data" => NoticeField::Bag(&self.session_data),
            "component" => text_field(self.component()),
            "action" => text_field(self.action()),
            "url" => text_field(self.url()),
            "hostname" => text_field(self.hostname()),
            "project_root" => text_field(self.project_root()),
            "environment_name" => NoticeField::Text(&self.environment_name),
            "notifier" => NoticeField::Notifier(&self.notifier),
            "current_user" => NoticeField::Bag(&self.current_user),
            "diagnostics" => NoticeField::List(&self.diagnostics),
            _ => return None,
        };
        Some(field)
    }

    /// Whether this notice should be suppressed.
    ///
    /// Evaluated in order, stopping at the first match: ignored class names,
    /// user-agent rules, then ignore predicates. A failing rule is an error,
    /// never a silent "not ignored".
    pub fn is_ignored(&self) -> Result<bool> {
        for rule in &self.ignore {
            if let IgnoreRule::Class(name) = rule {
                if self.exception_classes.iter().any(|class| class == name) {
                    debug!(rule = %rule.describe(), "Notice ignored by class");
                    return Ok(true);
                }
            }
        }

        if let Some(agent) = self.user_agent() {
            let value = Value::String(agent.to_string());
            for rule in &self.ignore_user_agent {
                let matched = rule
                    .matches(agent, &value)
                    .map_err(|source| NoticeError::Suppression {
                        rule: rule.describe(),
                        source,
                    })?;
                if matched {
                    debug!(rule = %rule.describe(), "Notice ignored by user agent");
                    return Ok(true);
                }
            }
        }

        for rule in &self.ignore {
            if let IgnoreRule::Predicate { predicate, .. } = rule {
                let matched = predicate(self).map_err(|source| NoticeError::Suppression {
                    rule: rule.describe(),
                    source,
                })?;
                if matched {
                    debug!(rule = %rule.describe(), "Notice ignored by predicate");
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

fn text_field(value: Option<&str>) -> NoticeField<'_> {
    value.map_or(NoticeField::Absent, NoticeField::Text)
}

impl fmt::Debug for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notice")
            .field("error_class", &self.error_class)
            .field("error_message", &self.error_message)
            .field("exception_classes", &self.exception_classes)
            .field("frames", &self.backtrace.len())
            .field("component", &self.component)
            .field("action", &self.action)
            .field("environment_name", &self.environment_name)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
