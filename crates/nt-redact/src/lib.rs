//! Parameter sanitization for error notices.
//!
//! This crate provides the cleaner that every parameter, CGI and session bag
//! passes through before it can be attached to a notice.
//!
//! # Key Features
//!
//! - **Blacklist mode**: values of matching keys are replaced with
//!   [`FILTERED_MARKER`] at every nesting depth; keys stay in place.
//! - **Whitelist mode**: only matching keys survive, level by level; anything
//!   else is dropped together with its contents.
//! - **Copy-based**: inputs are never mutated; the cleaned output is a new bag.
//! - **Fail-closed**: a predicate that fails aborts cleaning with an error
//!   instead of letting the value through.
//!
//! # Example
//!
//! ```
//! use nt_redact::{FilterRule, ParamsBag, ParamsCleaner};
//! use serde_json::json;
//!
//! let bag: ParamsBag = json!({"password": "secret", "user": "bob"})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//! let blacklist = vec![FilterRule::key("password")];
//! let cleaner = ParamsCleaner::new(&blacklist, &[]);
//!
//! let cleaned = cleaner.clean_bag(&bag).unwrap();
//! assert_eq!(cleaned["password"], "[FILTERED]");
//! assert_eq!(cleaned["user"], "bob");
//! ```

pub mod bag;
pub mod cleaner;
pub mod error;
pub mod rule;
mod url;

pub use bag::{to_bag, Cleaned, ParamsBag, FILTERED_MARKER};
pub use cleaner::{clean, CleanMode, CleanedBags, ParamsCleaner};
pub use error::{CleaningError, PredicateError, Result};
pub use rule::{FilterRule, RulePredicate, RuleSpec};
