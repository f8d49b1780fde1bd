//! Fuzz target for the bounded line scanner.
//!
//! Both split modes must terminate without panicking, never return a line
//! longer than the cap, and in exact mode reproduce the input when the
//! segments are joined again.

#![no_main]

use arbitrary::Arbitrary;
use baler_core::{LineScanner, SplitMode};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    max_line: u16,
    exact: bool,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mode = if input.exact {
        SplitMode::Exact
    } else {
        SplitMode::Lines
    };
    let max_line = u64::from(input.max_line).max(1);
    let mut scanner = LineScanner::new(&input.data[..], max_line, mode);

    let mut joined: Vec<Vec<u8>> = Vec::new();
    loop {
        match scanner.next_line() {
            Ok(Some(line)) => {
                assert!(line.len() as u64 <= max_line);
                joined.push(line.to_vec());
            }
            Ok(None) => break,
            Err(_) => return,
        }
    }

    if input.exact {
        assert_eq!(joined.join(&b'\n'), input.data);
    }
});
