//! End-to-end tests for convert/unconvert against real directories.

use baler_core::{
    convert, convert_report, unconvert, unconvert_report, BundleConfig, ErrorKind, MemoryLogger,
    NoopLogger,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, content).expect("write file");
}

/// Every regular file under `root`, keyed by `/`-separated relative path.
fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let rel = path
                    .strip_prefix(root)
                    .expect("below root")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                out.insert(rel, fs::read(&path).expect("read file"));
            }
        }
    }
    out
}

fn all_shard_bytes(dir: &Path) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (_, content) in read_tree(dir) {
        bytes.extend(content);
    }
    bytes
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_reproduces_tree() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    let restored = TempDir::new().expect("tempdir");

    write_file(src.path(), "main.go", b"package main\n\nfunc main() {}\n");
    write_file(src.path(), "README", b"no trailing newline");
    write_file(src.path(), "empty.txt", b"");
    write_file(src.path(), "lib/util.go", b"package lib\r\n// windows\r\n");
    write_file(src.path(), "lib/deep/blank_lines.txt", b"\n\n\n");

    let config = BundleConfig::default();
    let processed = convert(src.path(), shards.path(), &config, &NoopLogger).expect("convert");
    assert_eq!(processed.len(), 5);

    unconvert(shards.path(), restored.path(), &config, &NoopLogger).expect("unconvert");
    assert_eq!(read_tree(restored.path()), read_tree(src.path()));
}

#[test]
fn test_unterminated_last_line_at_buffer_limit_round_trips() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    let restored = TempDir::new().expect("tempdir");

    // a.txt fills the scan buffer exactly and is followed by another frame,
    // whose leading newline terminates its last line inside the shard.
    write_file(src.path(), "a.txt", b"0123456789");
    write_file(src.path(), "b.txt", b"x\n");

    let config = BundleConfig::default()
        .with_delimiter("#")
        .with_max_input_size(10);
    let processed = convert(src.path(), shards.path(), &config, &NoopLogger).expect("convert");
    assert_eq!(processed.as_slice(), ["a.txt", "b.txt"]);

    unconvert(shards.path(), restored.path(), &config, &NoopLogger).expect("unconvert");
    assert_eq!(read_tree(restored.path()), read_tree(src.path()));
}

#[test]
fn test_header_longer_than_buffer_is_skipped_with_warning() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    let restored = TempDir::new().expect("tempdir");

    write_file(src.path(), "a.txt", b"hi\n");
    write_file(src.path(), "some/deeply/nested/directory/file.txt", b"hi\n");

    let logger = MemoryLogger::new();
    let config = BundleConfig::default().with_max_input_size(32);
    let report =
        convert_report(src.path(), shards.path(), &config, &logger).expect("convert");

    assert_eq!(report.processed.as_slice(), ["a.txt"]);
    assert_eq!(report.skipped.unrepresentable, 1);
    assert!(logger
        .warnings()
        .iter()
        .any(|m| m.contains("some/deeply/nested/directory/file.txt")));
    assert!(!contains(&all_shard_bytes(shards.path()), b"nested"));

    unconvert(shards.path(), restored.path(), &config, &NoopLogger).expect("unconvert");
    let restored_tree = read_tree(restored.path());
    assert_eq!(restored_tree.keys().collect::<Vec<_>>(), ["a.txt"]);
}

#[test]
fn test_round_trip_across_many_shards() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    let restored = TempDir::new().expect("tempdir");

    for i in 0..20 {
        let body = format!("file {i}\n").repeat(i + 1);
        write_file(src.path(), &format!("dir{}/f{i}.txt", i % 3), body.as_bytes());
    }

    let config = BundleConfig::default()
        .with_max_input_size(512)
        .with_max_output_size(600);
    let report =
        convert_report(src.path(), shards.path(), &config, &NoopLogger).expect("convert");
    assert!(report.shards.len() > 1);

    let decoded =
        unconvert_report(shards.path(), restored.path(), &config, &NoopLogger).expect("unconvert");
    assert_eq!(decoded.shards_read.len(), report.shards.len());
    assert_eq!(decoded.files_written.len(), 20);
    assert_eq!(read_tree(restored.path()), read_tree(src.path()));
}

// ============================================================================
// Exclusion
// ============================================================================

#[test]
fn test_node_modules_directory_excluded() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    let restored = TempDir::new().expect("tempdir");

    write_file(src.path(), "index.js", b"require('pkg');\n");
    write_file(src.path(), "node_modules/pkg/index.js", b"SECRET_VENDOR_CODE\n");

    let config = BundleConfig::default().with_exclusions(["node_modules*"]);
    let processed = convert(src.path(), shards.path(), &config, &NoopLogger).expect("convert");

    assert_eq!(processed.as_slice(), ["index.js".to_string()]);
    assert!(!contains(&all_shard_bytes(shards.path()), b"SECRET_VENDOR_CODE"));

    unconvert(shards.path(), restored.path(), &config, &NoopLogger).expect("unconvert");
    assert!(!restored.path().join("node_modules").exists());
}

#[test]
fn test_file_patterns_exclude_at_any_listed_level() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");

    write_file(src.path(), "keep.rs", b"fn keep() {}\n");
    write_file(src.path(), "Cargo.lock", b"LOCKFILE\n");
    write_file(src.path(), "target/debug/out.txt", b"BUILD OUTPUT\n");

    let config = BundleConfig::default().with_exclusions(["*.lock", "target"]);
    let report =
        convert_report(src.path(), shards.path(), &config, &NoopLogger).expect("convert");

    assert_eq!(report.processed.as_slice(), ["keep.rs".to_string()]);
    assert_eq!(report.skipped.excluded, 2);
    let bytes = all_shard_bytes(shards.path());
    assert!(!contains(&bytes, b"LOCKFILE"));
    assert!(!contains(&bytes, b"BUILD OUTPUT"));
}

// ============================================================================
// Gate and rotation
// ============================================================================

#[test]
fn test_two_large_files_land_in_separate_shards() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");

    // 3 MiB each, in 1 KiB lines.
    let line = format!("{}\n", "a".repeat(1023));
    let body = line.repeat(3 * 1024);
    write_file(src.path(), "one.txt", body.as_bytes());
    write_file(src.path(), "two.txt", body.as_bytes());

    let config = BundleConfig::default()
        .with_max_input_size(4 * 1024 * 1024)
        .with_max_output_size(5 * 1024 * 1024);
    let report =
        convert_report(src.path(), shards.path(), &config, &NoopLogger).expect("convert");

    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.shards.len(), 2);
    for shard in &report.shards {
        assert!(fs::metadata(shard).expect("stat").len() <= 5 * 1024 * 1024);
    }
}

#[test]
fn test_size_line_and_utf8_gates() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");

    write_file(src.path(), "ok.txt", b"fine\n");
    write_file(src.path(), "huge.txt", &vec![b'x'; 2048]);
    write_file(src.path(), "tall.txt", "l\n".repeat(50).as_bytes());
    write_file(src.path(), "binary.bin", b"\x00\x9f\x92\x96\n");

    let config = BundleConfig::default()
        .with_max_input_size(1024)
        .with_max_input_lines(20)
        .with_max_output_size(4096);
    let report =
        convert_report(src.path(), shards.path(), &config, &NoopLogger).expect("convert");

    assert_eq!(report.processed.as_slice(), ["ok.txt".to_string()]);
    assert_eq!(report.skipped.too_large, 1);
    assert_eq!(report.skipped.too_many_lines, 1);
    assert_eq!(report.skipped.invalid_utf8, 1);
}

#[test]
fn test_existing_shards_keep_their_index() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    write_file(shards.path(), "output_0.txt", b"\n// filename: previous.txt\nearlier run");
    write_file(src.path(), "next.txt", b"this run\n");

    let config = BundleConfig::default();
    let report =
        convert_report(src.path(), shards.path(), &config, &NoopLogger).expect("convert");

    assert_eq!(report.shards, vec![shards.path().join("output_1.txt")]);
    assert_eq!(
        fs::read(shards.path().join("output_0.txt")).expect("read"),
        b"\n// filename: previous.txt\nearlier run"
    );
}

// ============================================================================
// Errors and logging
// ============================================================================

#[test]
fn test_malformed_shard_listing_aborts_convert() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    write_file(src.path(), "a.txt", b"a\n");
    write_file(shards.path(), "output_zz.txt", b"");

    let err = convert(src.path(), shards.path(), &BundleConfig::default(), &NoopLogger)
        .expect_err("malformed listing");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_empty_delimiter_is_config_error() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    write_file(src.path(), "a.txt", b"a\n");

    let config = BundleConfig::default().with_delimiter("");
    let err = convert(src.path(), shards.path(), &config, &NoopLogger).expect_err("empty delimiter");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_verbose_reports_through_injected_logger() {
    let src = TempDir::new().expect("tempdir");
    let shards = TempDir::new().expect("tempdir");
    let restored = TempDir::new().expect("tempdir");
    write_file(src.path(), "a.txt", b"a\n");
    write_file(src.path(), "skip.tmp", b"tmp\n");

    let logger = MemoryLogger::new();
    let config = BundleConfig::default()
        .with_exclusions(["*.tmp"])
        .with_verbose(true);
    convert(src.path(), shards.path(), &config, &logger).expect("convert");
    unconvert(shards.path(), restored.path(), &config, &logger).expect("unconvert");

    let infos = logger.infos();
    assert!(infos.iter().any(|m| m.contains("skip.tmp")));
    assert!(infos.iter().any(|m| m.contains("reading shard")));
    assert!(logger.warnings().is_empty());
    assert!(logger.errors().is_empty());
}
