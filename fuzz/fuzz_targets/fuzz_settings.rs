//! Fuzz target for notifier.json parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nt_config::{validate_settings, NotifierSettings};

fuzz_target!(|data: &[u8]| {
    // Parse errors and validation errors are fine; panics are not
    if let Ok(settings) = serde_json::from_slice::<NotifierSettings>(data) {
        let _ = validate_settings(&settings);
    }
});
