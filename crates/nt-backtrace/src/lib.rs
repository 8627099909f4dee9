//! Backtrace parsing and frame filtering for error notices.
//!
//! A raw trace arrives in one of several shapes: plain lines such as
//! `app/models/user.rb:10:in 'save'`, structured frame records, or nothing at
//! all. [`parse`] turns any of them into an ordered [`Backtrace`] and runs
//! every frame through a [`FilterChain`].
//!
//! # Example
//!
//! ```
//! use nt_backtrace::{parse, FilterChain, RawFrame};
//!
//! let raw = vec![
//!     RawFrame::from("foo.rb:10:in 'bar'"),
//!     RawFrame::from("garbage-line"),
//! ];
//! let backtrace = parse(&raw, &FilterChain::new());
//!
//! assert_eq!(backtrace.len(), 2);
//! assert_eq!(backtrace.frames()[0].line, Some(10));
//! assert!(!backtrace.frames()[1].parsed);
//! ```

pub mod capture;
pub mod filter;
pub mod frame;
pub mod parse;

pub use capture::{capture_current, capture_current_skipping};
pub use filter::{FilterChain, FrameFilter};
pub use frame::{Backtrace, Frame, FrameRecord, RawFrame};
pub use parse::{parse, parse_line};
