//! Raw trace parsing.

use crate::{Backtrace, FilterChain, Frame, RawFrame};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

// file:line with an optional :in 'method' (or :in `method')
static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:[a-zA-Z]:)?[^:]+):(\d+)(?::in [`']([^']+)')?$").unwrap()
});

/// Parse a single trace line.
///
/// Lines that do not match `<file>:<line>[:in '<method>']` become unparsed
/// frames that keep the original text.
pub fn parse_line(line: &str) -> Frame {
    let trimmed = line.trim();
    let Some(caps) = LINE_PATTERN.captures(trimmed) else {
        return Frame::unparsed(line);
    };

    // Out-of-range line numbers are treated like any other unrecognized input.
    let Ok(number) = caps[2].parse::<u32>() else {
        return Frame::unparsed(line);
    };

    let method = caps.get(3).map(|m| m.as_str().to_string());
    Frame::parsed(line, &caps[1], Some(number), method)
}

/// Parse a raw trace and run every frame through the filter chain.
///
/// Frame order is preserved; frames dropped by a filter are removed. An empty
/// trace yields an empty backtrace.
pub fn parse(raw: &[RawFrame], filters: &FilterChain) -> Backtrace {
    let frames: Vec<Frame> = raw
        .iter()
        .map(|entry| match entry {
            RawFrame::Line(line) => parse_line(line),
            RawFrame::Record(record) => Frame::from_record(record),
        })
        .filter_map(|frame| filters.apply(frame))
        .collect();

    trace!(
        input = raw.len(),
        kept = frames.len(),
        filters = filters.len(),
        "Parsed backtrace"
    );

    Backtrace::new(frames)
}
