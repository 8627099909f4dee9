//! The recursive parameter cleaner.
//!
//! Mode selection:
//! - a non-empty whitelist wins: at every level only matching keys survive;
//! - otherwise a non-empty blacklist redacts matching keys at every level;
//! - with neither, bags pass through as independent copies.

use crate::bag::{Cleaned, ParamsBag, FILTERED_MARKER};
use crate::{CleaningError, FilterRule, Result};
use serde_json::Value;
use tracing::trace;

/// How a cleaner treats keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    /// Retain only keys matching a whitelist rule.
    Whitelist,
    /// Redact values of keys matching a blacklist rule.
    Blacklist,
    /// Copy without change.
    Passthrough,
}

/// The three cleaned bags of a notice.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedBags {
    pub parameters: Cleaned<ParamsBag>,
    pub cgi_data: Cleaned<ParamsBag>,
    pub session_data: Cleaned<ParamsBag>,
}

/// Applies blacklist or whitelist rules to parameter bags.
///
/// The cleaner borrows its rule lists; they are never modified, so one rule
/// snapshot can be shared by any number of concurrent cleaners.
#[derive(Debug, Clone, Copy)]
pub struct ParamsCleaner<'a> {
    blacklist: &'a [FilterRule],
    whitelist: &'a [FilterRule],
}

impl<'a> ParamsCleaner<'a> {
    /// Create a cleaner over the given rule lists.
    pub fn new(blacklist: &'a [FilterRule], whitelist: &'a [FilterRule]) -> Self {
        Self {
            blacklist,
            whitelist,
        }
    }

    /// The mode implied by the rule lists.
    pub fn mode(&self) -> CleanMode {
        if !self.whitelist.is_empty() {
            CleanMode::Whitelist
        } else if !self.blacklist.is_empty() {
            CleanMode::Blacklist
        } else {
            CleanMode::Passthrough
        }
    }

    /// Clean one bag, returning a new copy.
    pub fn clean_bag(&self, bag: &ParamsBag) -> Result<Cleaned<ParamsBag>> {
        let cleaned = match self.mode() {
            CleanMode::Passthrough => bag.clone(),
            mode => self.clean_map(mode, bag, "")?,
        };
        Ok(Cleaned::new(cleaned))
    }

    /// Clean the parameter, CGI and session bags independently.
    pub fn clean_all(
        &self,
        parameters: &ParamsBag,
        cgi_data: &ParamsBag,
        session_data: &ParamsBag,
    ) -> Result<CleanedBags> {
        trace!(
            mode = ?self.mode(),
            blacklist = self.blacklist.len(),
            whitelist = self.whitelist.len(),
            "Cleaning parameter bags"
        );

        Ok(CleanedBags {
            parameters: self.clean_bag(parameters)?,
            cgi_data: self.clean_bag(cgi_data)?,
            session_data: self.clean_bag(session_data)?,
        })
    }

    /// Clean the query string of a URL.
    ///
    /// Blacklisted query values become [`FILTERED_MARKER`]; in whitelist mode
    /// non-matching pairs are dropped.
    pub fn clean_url(&self, url: &str) -> Result<Cleaned<String>> {
        crate::url::clean_query(self, url).map(Cleaned::new)
    }

    /// Whether `key` matches any rule of the list for `mode`.
    pub(crate) fn matches(
        &self,
        mode: CleanMode,
        key: &str,
        value: &Value,
        parent_path: &str,
    ) -> Result<bool> {
        let rules = match mode {
            CleanMode::Whitelist => self.whitelist,
            CleanMode::Blacklist => self.blacklist,
            CleanMode::Passthrough => return Ok(false),
        };

        for rule in rules {
            let matched = rule
                .matches(key, value)
                .map_err(|source| CleaningError::Predicate {
                    rule: rule.describe(),
                    key_path: join_path(parent_path, key),
                    source,
                })?;
            if matched {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn clean_map(&self, mode: CleanMode, map: &ParamsBag, path: &str) -> Result<ParamsBag> {
        let mut out = ParamsBag::new();

        for (key, value) in map {
            let matched = self.matches(mode, key, value, path)?;
            match (mode, matched) {
                (CleanMode::Blacklist, true) => {
                    out.insert(key.clone(), Value::String(FILTERED_MARKER.to_string()));
                }
                (CleanMode::Whitelist, false) => {}
                _ => {
                    let child_path = join_path(path, key);
                    out.insert(key.clone(), self.clean_value(mode, value, &child_path)?);
                }
            }
        }

        Ok(out)
    }

    fn clean_value(&self, mode: CleanMode, value: &Value, path: &str) -> Result<Value> {
        match value {
            Value::Object(map) => Ok(Value::Object(self.clean_map(mode, map, path)?)),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.clean_value(mode, item, &format!("{}[{}]", path, idx)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            scalar => Ok(scalar.clone()),
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Clean the three bags of a notice with the given rule lists.
///
/// Inputs are never modified; the result holds independent copies.
pub fn clean(
    parameters: &ParamsBag,
    cgi_data: &ParamsBag,
    session_data: &ParamsBag,
    blacklist: &[FilterRule],
    whitelist: &[FilterRule],
) -> Result<CleanedBags> {
    ParamsCleaner::new(blacklist, whitelist).clean_all(parameters, cgi_data, session_data)
}
