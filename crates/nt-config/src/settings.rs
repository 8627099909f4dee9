//! On-disk notifier settings.

use nt_redact::RuleSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::resolve::{resolve_config, ConfigPath};
use crate::validate::{ValidationError, ValidationResult};

/// Name, version and homepage of the notifier library reported in every notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierIdentity {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for NotifierIdentity {
    fn default() -> Self {
        Self {
            name: "notice-toolkit".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            url: None,
        }
    }
}

/// Contents of `notifier.json`.
///
/// Every field is optional in the file; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub schema_version: String,

    /// Project API key. Never logged.
    pub api_key: Option<String>,

    pub environment_name: String,

    /// Application root, replaced by a placeholder in backtrace files.
    pub project_root: Option<String>,

    pub notifier: NotifierIdentity,

    /// Blacklist rules for parameter, CGI and session bags.
    pub params_filters: Vec<RuleSpec>,

    /// Whitelist rules; when non-empty the blacklist is not used.
    pub params_whitelist_filters: Vec<RuleSpec>,

    /// Error class names that are never reported.
    pub ignore: Vec<String>,

    /// Rules tested against the request's `HTTP_USER_AGENT`.
    pub ignore_user_agent: Vec<RuleSpec>,

    /// Environments in which notices are built but not delivered.
    pub development_environments: Vec<String>,

    pub use_default_backtrace_filters: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            api_key: None,
            environment_name: "production".to_string(),
            project_root: None,
            notifier: NotifierIdentity::default(),
            params_filters: vec![
                RuleSpec::Key("password".to_string()),
                RuleSpec::Key("password_confirmation".to_string()),
            ],
            params_whitelist_filters: Vec::new(),
            ignore: Vec::new(),
            ignore_user_agent: Vec::new(),
            development_environments: vec!["development".to_string(), "test".to_string()],
            use_default_backtrace_filters: true,
        }
    }
}

impl NotifierSettings {
    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse settings from a JSON string.
    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Failed to parse settings: {}", e)))
    }

    /// Resolve the settings file and load it, falling back to defaults.
    ///
    /// Returns the settings together with where they came from.
    pub fn load(cli_path: Option<&Path>) -> ValidationResult<(Self, ConfigPath)> {
        let resolved = resolve_config(cli_path);
        let settings = match &resolved.path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        tracing::info!(
            source = %resolved.source,
            path = ?resolved.path,
            "Loaded notifier settings"
        );
        Ok((settings, resolved))
    }
}
