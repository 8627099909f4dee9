//! Fuzz target for backtrace line parsing.
//!
//! Tests that `parse_line` handles arbitrary input without panicking and
//! always keeps the raw text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nt_backtrace::parse_line;

fuzz_target!(|data: &str| {
    let frame = parse_line(data);
    assert_eq!(frame.raw, data);
    if !frame.parsed {
        assert!(frame.line.is_none());
    }
});
