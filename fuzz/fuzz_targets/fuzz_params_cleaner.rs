//! Fuzz target for parameter cleaning.
//!
//! Blacklisted keys must never keep their value, at any depth.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nt_redact::{FilterRule, ParamsCleaner, FILTERED_MARKER};
use serde_json::Value;

fn assert_filtered(value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "secret" {
                    assert_eq!(child, FILTERED_MARKER);
                } else {
                    assert_filtered(child);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(assert_filtered),
        _ => {}
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(Value::Object(bag)) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let blacklist = [FilterRule::key("secret")];
    let cleaner = ParamsCleaner::new(&blacklist, &[]);
    if let Ok(cleaned) = cleaner.clean_bag(&bag) {
        assert_filtered(&Value::Object(cleaned.into_inner()));
    }
});
