//! Filter rules.
//!
//! A rule decides whether a key matches. The same rule type serves both the
//! blacklist (redact on match) and the whitelist (retain on match); the
//! cleaner decides what a match means.

use crate::{CleaningError, PredicateError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A user-supplied predicate over a key name and its value.
pub type RulePredicate =
    Arc<dyn Fn(&str, &Value) -> std::result::Result<bool, PredicateError> + Send + Sync>;

/// A single key-matching rule.
#[derive(Clone)]
pub enum FilterRule {
    /// Exact key-name equality.
    Key(String),
    /// Regex test on the key name.
    Pattern(Regex),
    /// Arbitrary predicate over key name and value.
    Predicate {
        /// Name used in diagnostics.
        name: String,
        predicate: RulePredicate,
    },
}

impl FilterRule {
    /// Exact key-name rule.
    pub fn key(key: impl Into<String>) -> Self {
        FilterRule::Key(key.into())
    }

    /// Regex rule; fails if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(FilterRule::Pattern)
            .map_err(|e| CleaningError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Predicate rule.
    pub fn predicate<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str, &Value) -> std::result::Result<bool, PredicateError> + Send + Sync + 'static,
    {
        FilterRule::Predicate {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Test a key (and its value) against this rule.
    pub fn matches(&self, key: &str, value: &Value) -> std::result::Result<bool, PredicateError> {
        match self {
            FilterRule::Key(expected) => Ok(key == expected),
            FilterRule::Pattern(regex) => Ok(regex.is_match(key)),
            FilterRule::Predicate { predicate, .. } => predicate(key, value),
        }
    }

    /// Short human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            FilterRule::Key(key) => format!("key:{}", key),
            FilterRule::Pattern(regex) => format!("pattern:{}", regex.as_str()),
            FilterRule::Predicate { name, .. } => format!("predicate:{}", name),
        }
    }
}

impl fmt::Debug for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterRule({})", self.describe())
    }
}

impl From<&str> for FilterRule {
    fn from(key: &str) -> Self {
        FilterRule::key(key)
    }
}

impl From<String> for FilterRule {
    fn from(key: String) -> Self {
        FilterRule::Key(key)
    }
}

/// Serializable rule description, as found in configuration files.
///
/// A bare string is an exact key name; `{"pattern": "..."}` is a regex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Exact key name.
    Key(String),
    /// Regex on the key name.
    Pattern { pattern: String },
}

impl RuleSpec {
    /// Compile into a [`FilterRule`].
    pub fn compile(&self) -> Result<FilterRule> {
        match self {
            RuleSpec::Key(key) => Ok(FilterRule::key(key.clone())),
            RuleSpec::Pattern { pattern } => FilterRule::pattern(pattern),
        }
    }

    /// Compile a list of specs, failing on the first invalid pattern.
    pub fn compile_all(specs: &[RuleSpec]) -> Result<Vec<FilterRule>> {
        specs.iter().map(RuleSpec::compile).collect()
    }
}
