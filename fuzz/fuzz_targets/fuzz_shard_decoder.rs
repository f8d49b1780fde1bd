//! Fuzz target for shard decoding.
//!
//! Shards may come from untrusted sources: decoding must never panic and
//! must never write outside the destination directory.

#![no_main]

use baler_core::{BundleConfig, Decoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(dest) = tempfile::TempDir::new() else {
        return;
    };
    let root = dest.path().to_path_buf();
    let config = BundleConfig::default().with_buffer_size(4096);

    if let Ok(written) = Decoder::new(&config).decode_stream(data, &root) {
        for relative in written {
            assert!(root.join(&relative).starts_with(&root));
        }
    }
});
