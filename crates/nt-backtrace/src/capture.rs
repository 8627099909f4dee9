//! Capture of the caller's current execution stack.

use crate::{FrameRecord, RawFrame};
use tracing::trace;

/// Symbol prefixes that belong to the capture machinery itself.
const CAPTURE_PREFIXES: &[&str] = &["backtrace::", "nt_backtrace::capture::capture_current"];

/// Capture the current stack as raw frames, most recent call first.
///
/// Frames belonging to the capture machinery are skipped.
pub fn capture_current() -> Vec<RawFrame> {
    capture_current_skipping(&[])
}

/// Capture the current stack, additionally skipping every frame up to and
/// including the deepest one whose demangled symbol starts with one of
/// `skip_prefixes`.
///
/// Closures and combinators called by a skipped function sit above it on
/// the stack, so they are dropped along with it.
pub fn capture_current_skipping(skip_prefixes: &[&str]) -> Vec<RawFrame> {
    let mut resolved: Vec<(Option<String>, RawFrame)> = Vec::new();

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            let name = symbol.name().map(|n| format!("{n:#}"));
            let raw = match symbol.filename() {
                Some(path) => RawFrame::Record(FrameRecord {
                    file: path.display().to_string(),
                    line: symbol.lineno(),
                    method: name.clone(),
                }),
                None => match &name {
                    Some(name) => RawFrame::Line(name.clone()),
                    None => return,
                },
            };
            resolved.push((name, raw));
        });
        true
    });

    let is_skipped = |name: &Option<String>| {
        name.as_deref().is_some_and(|name| {
            CAPTURE_PREFIXES
                .iter()
                .chain(skip_prefixes.iter())
                .any(|prefix| name.starts_with(prefix))
        })
    };
    let start = resolved
        .iter()
        .rposition(|(name, _)| is_skipped(name))
        .map_or(0, |idx| idx + 1);

    let frames: Vec<RawFrame> = resolved.into_iter().skip(start).map(|(_, raw)| raw).collect();
    trace!(frames = frames.len(), skipped = start, "Captured current stack");
    frames
}
