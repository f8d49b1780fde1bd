//! Fuzz target for exclusion pattern compilation and matching.

#![no_main]

use baler_core::PathFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, String)| {
    let (pattern, path) = input;
    // Malformed patterns are errors, never panics.
    if let Ok(filter) = PathFilter::new(&[pattern]) {
        let _ = filter.should_ignore(&path);
    }
});
