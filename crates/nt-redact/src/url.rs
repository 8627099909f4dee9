//! Query-string filtering for request URLs.

use crate::bag::FILTERED_MARKER;
use crate::cleaner::{CleanMode, ParamsCleaner};
use crate::Result;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;
use url::{ParseError, Position, Url};

/// Base used to resolve path-only URLs such as `/orders?page=2`.
static RELATIVE_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://relative.invalid/").unwrap());

/// Clean the query string of `url` with the cleaner's rules.
///
/// Rules are tested against percent-decoded keys. Bracketed keys such as
/// `user[password]` also match on each segment. A URL that cannot be parsed
/// loses its whole query. When no pair changes, the URL is returned as given.
pub(crate) fn clean_query(cleaner: &ParamsCleaner<'_>, url: &str) -> Result<String> {
    let mode = cleaner.mode();
    if mode == CleanMode::Passthrough || !url.contains('?') {
        return Ok(url.to_string());
    }

    let (mut parsed, relative) = match Url::parse(url) {
        Ok(parsed) => (parsed, false),
        Err(ParseError::RelativeUrlWithoutBase) => match RELATIVE_BASE.join(url) {
            Ok(parsed) => (parsed, true),
            Err(e) => return Ok(without_query(url, &e)),
        },
        Err(e) => return Ok(without_query(url, &e)),
    };

    let mut kept: Vec<(String, String)> = Vec::new();
    let mut changed = false;
    for (key, value) in parsed.query_pairs().into_owned() {
        let matched = query_key_matches(cleaner, mode, &key, &value)?;
        match (mode, matched) {
            (CleanMode::Blacklist, true) => {
                kept.push((key, FILTERED_MARKER.to_string()));
                changed = true;
            }
            (CleanMode::Whitelist, false) => changed = true,
            _ => kept.push((key, value)),
        }
    }

    if !changed {
        return Ok(url.to_string());
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&kept);
    }

    if relative {
        Ok(parsed[Position::BeforePath..].to_string())
    } else {
        Ok(parsed.into())
    }
}

fn without_query(url: &str, error: &ParseError) -> String {
    debug!(error = %error, "Unparseable URL, dropping query string");
    match url.find('?') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

/// `user[address][zip]` -> `user`, `address`, `zip`.
fn key_segments(key: &str) -> impl Iterator<Item = &str> {
    key.split(['[', ']']).filter(|segment| !segment.is_empty())
}

fn query_key_matches(
    cleaner: &ParamsCleaner<'_>,
    mode: CleanMode,
    key: &str,
    value: &str,
) -> Result<bool> {
    let value = Value::String(value.to_string());
    if cleaner.matches(mode, key, &value, "url")? {
        return Ok(true);
    }

    match mode {
        CleanMode::Blacklist => {
            for segment in key_segments(key).filter(|segment| *segment != key) {
                if cleaner.matches(mode, segment, &value, "url")? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        // A whitelisted root keeps everything nested under it.
        CleanMode::Whitelist => match key_segments(key).next() {
            Some(root) if root != key => cleaner.matches(mode, root, &value, "url"),
            _ => Ok(false),
        },
        CleanMode::Passthrough => Ok(false),
    }
}
