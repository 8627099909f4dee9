//! Frame filter chains.
//!
//! A filter receives one owned [`Frame`] and returns either a (possibly
//! modified) frame or `None` to drop it. Filters run in order, each one seeing
//! the output of the previous. Because every call owns its frame, a filter can
//! never observe or alter any other frame.

use crate::Frame;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A single frame filter.
pub type FrameFilter = Arc<dyn Fn(Frame) -> Option<Frame> + Send + Sync>;

/// Placeholder substituted for the project root in file paths.
pub const PROJECT_ROOT_PLACEHOLDER: &str = "[PROJECT_ROOT]";

/// Placeholder substituted for cargo registry source directories.
pub const CARGO_REGISTRY_PLACEHOLDER: &str = "[CARGO_REGISTRY]";

/// Placeholder substituted for rust toolchain sources.
pub const RUST_SRC_PLACEHOLDER: &str = "[RUST_SRC]";

static CARGO_REGISTRY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*[/\\]\.cargo[/\\]registry[/\\]src[/\\][^/\\]+[/\\]").unwrap());

static RUST_SRC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:/rustc/[0-9a-f]+/|.*[/\\]lib[/\\]rustlib[/\\]src[/\\]rust[/\\])").unwrap()
});

/// An ordered list of frame filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<FrameFilter>,
}

impl FilterChain {
    /// An empty chain; frames pass through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in chain: project root, leading `./`, cargo registry and
    /// rust toolchain paths.
    pub fn with_defaults(project_root: Option<&str>) -> Self {
        let mut chain = Self::new();
        if let Some(root) = project_root {
            chain.push_filter(project_root_filter(root));
        }
        chain.push_filter(strip_dot_slash_filter());
        chain.push_filter(cargo_registry_filter());
        chain.push_filter(rust_src_filter());
        chain
    }

    /// Append a filter closure.
    pub fn push<F>(&mut self, filter: F)
    where
        F: Fn(Frame) -> Option<Frame> + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
    }

    /// Append an already shared filter.
    pub fn push_filter(&mut self, filter: FrameFilter) {
        self.filters.push(filter);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: Fn(Frame) -> Option<Frame> + Send + Sync + 'static,
    {
        self.push(filter);
        self
    }

    /// Append every filter of another chain.
    pub fn extend(&mut self, other: &FilterChain) {
        self.filters.extend(other.filters.iter().cloned());
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run one frame through the chain, stopping at the first drop.
    pub fn apply(&self, frame: Frame) -> Option<Frame> {
        self.filters
            .iter()
            .try_fold(frame, |frame, filter| filter(frame))
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Rewrite the file of a parsed frame.
fn map_file(mut frame: Frame, rewrite: impl Fn(&str) -> Option<String>) -> Frame {
    if let Some(file) = frame.file.as_deref() {
        if let Some(new_file) = rewrite(file) {
            frame.file = Some(new_file);
        }
    }
    frame
}

/// Replace a leading project root with `[PROJECT_ROOT]`.
pub fn project_root_filter(root: &str) -> FrameFilter {
    let root = root.trim_end_matches(['/', '\\']).to_string();
    Arc::new(move |frame| {
        if root.is_empty() {
            return Some(frame);
        }
        Some(map_file(frame, |file| {
            file.strip_prefix(root.as_str())
                .filter(|rest| rest.is_empty() || rest.starts_with(['/', '\\']))
                .map(|rest| format!("{}{}", PROJECT_ROOT_PLACEHOLDER, rest))
        }))
    })
}

/// Remove a leading `./` from relative paths.
pub fn strip_dot_slash_filter() -> FrameFilter {
    Arc::new(|frame| {
        Some(map_file(frame, |file| {
            file.strip_prefix("./").map(str::to_string)
        }))
    })
}

/// Collapse `~/.cargo/registry/src/<index>/` into `[CARGO_REGISTRY]/`.
pub fn cargo_registry_filter() -> FrameFilter {
    Arc::new(|frame| {
        Some(map_file(frame, |file| {
            CARGO_REGISTRY_PATTERN
                .find(file)
                .map(|m| format!("{}/{}", CARGO_REGISTRY_PLACEHOLDER, &file[m.end()..]))
        }))
    })
}

/// Collapse rust toolchain source paths into `[RUST_SRC]/`.
pub fn rust_src_filter() -> FrameFilter {
    Arc::new(|frame| {
        Some(map_file(frame, |file| {
            RUST_SRC_PATTERN
                .find(file)
                .map(|m| format!("{}/{}", RUST_SRC_PLACEHOLDER, &file[m.end()..]))
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_line;

    fn file_after(filter: &FrameFilter, line: &str) -> Option<String> {
        filter(parse_line(line)).and_then(|f| f.file)
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let frame = parse_line("foo.rb:1:in 'x'");
        assert_eq!(FilterChain::new().apply(frame.clone()), Some(frame));
    }

    #[test]
    fn test_chain_order() {
        let chain = FilterChain::new()
            .with(|mut f| {
                f.method = Some("first".to_string());
                Some(f)
            })
            .with(|mut f| {
                let prev = f.method.take().unwrap_or_default();
                f.method = Some(format!("{}-second", prev));
                Some(f)
            });
        let out = chain.apply(parse_line("a.rb:1")).unwrap();
        assert_eq!(out.method.as_deref(), Some("first-second"));
    }

    #[test]
    fn test_chain_stops_on_drop() {
        let chain = FilterChain::new()
            .with(|_| None)
            .with(|_| panic!("must not run after a drop"));
        assert!(chain.apply(parse_line("a.rb:1")).is_none());
    }

    #[test]
    fn test_project_root_filter() {
        let filter = project_root_filter("/srv/app/");
        assert_eq!(
            file_after(&filter, "/srv/app/lib/foo.rb:3:in 'x'").as_deref(),
            Some("[PROJECT_ROOT]/lib/foo.rb")
        );
        // a sibling directory sharing the prefix is left alone
        assert_eq!(
            file_after(&filter, "/srv/application/foo.rb:3").as_deref(),
            Some("/srv/application/foo.rb")
        );
    }

    #[test]
    fn test_strip_dot_slash() {
        let filter = strip_dot_slash_filter();
        assert_eq!(
            file_after(&filter, "./lib/foo.rb:3").as_deref(),
            Some("lib/foo.rb")
        );
    }

    #[test]
    fn test_cargo_registry_filter() {
        let filter = cargo_registry_filter();
        let line = "/home/dev/.cargo/registry/src/index.crates.io-6f17d22bba15001f/tokio-1.40.0/src/runtime/mod.rs:12";
        assert_eq!(
            file_after(&filter, line).as_deref(),
            Some("[CARGO_REGISTRY]/tokio-1.40.0/src/runtime/mod.rs")
        );
    }

    #[test]
    fn test_rust_src_filter() {
        let filter = rust_src_filter();
        let line = "/rustc/90b35a6239c3d8bdabc530a6a0816f7ff89a0aaf/library/std/src/panicking.rs:584";
        assert_eq!(
            file_after(&filter, line).as_deref(),
            Some("[RUST_SRC]/library/std/src/panicking.rs")
        );
    }

    #[test]
    fn test_filters_leave_unparsed_frames() {
        let chain = FilterChain::with_defaults(Some("/srv/app"));
        let out = chain.apply(parse_line("garbage-line")).unwrap();
        assert!(!out.parsed);
        assert_eq!(out.raw, "garbage-line");
    }
}
