//! Fuzz target for notice rendering.
//!
//! Arbitrary input documents must either render in both formats or fail with
//! an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nt_core::input::InputDocument;
use nt_core::{render, Configuration, PayloadFormat};

fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<InputDocument>(data) else {
        return;
    };
    let Ok(notice) = document.build(&Configuration::default()) else {
        return;
    };
    let _ = render(&notice, PayloadFormat::Xml);
    render(&notice, PayloadFormat::Json).expect("JSON rendering is total");
});
