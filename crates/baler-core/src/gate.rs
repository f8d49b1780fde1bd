//! Per-file admission checks.
//!
//! A failed check is a skip decision, not an error. Only filesystem failures
//! and over-long lines abort the run.

use crate::frame;
use crate::scan::{LineScanner, SplitMode};
use crate::{BalerError, BundleConfig, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Only the first lines are checked for UTF-8 validity.
pub const UTF8_SAMPLE_LINES: u64 = 10;

/// Result of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub is_valid_utf8: bool,
    pub is_valid_line_count: bool,
    pub is_valid_size: bool,
    pub size_bytes: u64,
    /// Content lines that start with the delimiter. Informational only.
    pub delimiter_collisions: u64,
}

/// Why a file was not bundled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooLarge,
    TooManyLines,
    InvalidUtf8,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::TooLarge => "exceeds max input file size",
            Rejection::TooManyLines => "exceeds max input file lines",
            Rejection::InvalidUtf8 => "invalid UTF-8 in the first lines",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ValidationOutcome {
    /// True when every check passed.
    pub fn is_acceptable(&self) -> bool {
        self.rejection().is_none()
    }

    /// The first failed check, in size / lines / UTF-8 order.
    pub fn rejection(&self) -> Option<Rejection> {
        if !self.is_valid_size {
            Some(Rejection::TooLarge)
        } else if !self.is_valid_line_count {
            Some(Rejection::TooManyLines)
        } else if !self.is_valid_utf8 {
            Some(Rejection::InvalidUtf8)
        } else {
            None
        }
    }
}

/// Check `path` against the size, line-count and UTF-8 limits of `config`.
///
/// Oversized files are rejected on metadata alone; their content is not
/// scanned, and the content fields read as passed.
pub fn validate(path: &Path, config: &BundleConfig) -> Result<ValidationOutcome> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        BalerError::io(format!("failed to get file info for {}", path.display()), e)
    })?;
    let size_bytes = metadata.len();

    let mut outcome = ValidationOutcome {
        is_valid_utf8: true,
        is_valid_line_count: true,
        is_valid_size: size_bytes <= config.max_input_size,
        size_bytes,
        delimiter_collisions: 0,
    };
    if !outcome.is_valid_size {
        return Ok(outcome);
    }

    let file = File::open(path)
        .map_err(|e| BalerError::io(format!("failed to open {}", path.display()), e))?;
    let mut scanner = LineScanner::new(
        BufReader::new(file),
        config.effective_buffer_size(),
        SplitMode::Lines,
    );

    let mut line_count: u64 = 0;
    while let Some(line) = scanner
        .next_line()
        .map_err(|e| scan_error(path, e))?
    {
        line_count += 1;
        if line_count <= UTF8_SAMPLE_LINES && std::str::from_utf8(line).is_err() {
            outcome.is_valid_utf8 = false;
        }
        if frame::collides_with_delimiter(line, &config.delimiter) {
            outcome.delimiter_collisions += 1;
        }
    }

    outcome.is_valid_line_count = line_count <= config.max_input_lines;
    Ok(outcome)
}

fn scan_error(path: &Path, err: BalerError) -> BalerError {
    match err {
        BalerError::Io { message, source } => BalerError::Io {
            message: format!("error scanning file {}: {}", path.display(), message),
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn config(max_size: u64, max_lines: u64) -> BundleConfig {
        BundleConfig::new()
            .with_max_input_size(max_size)
            .with_max_input_lines(max_lines)
    }

    #[test]
    fn test_valid_small_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "test.txt", b"test\nfile\ncontent");

        let outcome = validate(&path, &config(1024, 10)).unwrap();
        assert!(outcome.is_acceptable());
        assert_eq!(outcome.size_bytes, 17);
        assert_eq!(outcome.rejection(), None);
    }

    #[test]
    fn test_file_exceeding_max_lines() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "test.txt", b"1\n2\n3\n4\n5\n6");

        let outcome = validate(&path, &config(1024, 3)).unwrap();
        assert!(outcome.is_valid_utf8);
        assert!(!outcome.is_valid_line_count);
        assert!(outcome.is_valid_size);
        assert_eq!(outcome.rejection(), Some(Rejection::TooManyLines));
    }

    #[test]
    fn test_line_limit_is_inclusive() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "test.txt", b"1\n2\n3\n");

        assert!(validate(&path, &config(1024, 3)).unwrap().is_valid_line_count);
        assert!(!validate(&path, &config(1024, 2)).unwrap().is_valid_line_count);
    }

    #[test]
    fn test_file_exceeding_max_size() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "test.txt", b"large content");

        let outcome = validate(&path, &config(5, 10)).unwrap();
        assert!(outcome.is_valid_utf8);
        assert!(outcome.is_valid_line_count);
        assert!(!outcome.is_valid_size);
        assert_eq!(outcome.size_bytes, 13);
        assert_eq!(outcome.rejection(), Some(Rejection::TooLarge));
    }

    #[test]
    fn test_oversized_single_line_is_a_skip_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "big.txt", &vec![b'a'; 4096]);

        let outcome = validate(&path, &config(100, 10).with_buffer_size(64)).unwrap();
        assert!(!outcome.is_valid_size);
    }

    #[test]
    fn test_long_line_beyond_buffer_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "wide.txt", &vec![b'a'; 200]);

        let err = validate(&path, &config(1024, 10).with_buffer_size(64)).unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("wide.txt"));
    }

    #[test]
    fn test_invalid_utf8_in_sample() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bin.dat", b"ok\n\xff\xfe\nok\n");

        let outcome = validate(&path, &config(1024, 10)).unwrap();
        assert!(!outcome.is_valid_utf8);
        assert_eq!(outcome.rejection(), Some(Rejection::InvalidUtf8));
    }

    #[test]
    fn test_invalid_utf8_after_sample_is_not_checked() {
        let dir = TempDir::new().unwrap();
        let mut content = b"line\n".repeat(10);
        content.extend_from_slice(b"\xff\xfe\n");
        let path = write(&dir, "late.txt", &content);

        let outcome = validate(&path, &config(1024, 100)).unwrap();
        assert!(outcome.is_valid_utf8);
        assert!(outcome.is_acceptable());
    }

    #[test]
    fn test_delimiter_collisions_counted() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tricky.rs",
            b"// filename: fake.rs\nfn main() {}\n// filename: other\n",
        );

        let outcome = validate(&path, &config(1024, 10)).unwrap();
        assert_eq!(outcome.delimiter_collisions, 2);
        assert!(outcome.is_acceptable());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = validate(&dir.path().join("nope"), &config(1024, 10)).unwrap_err();
        assert!(err.is_io());
    }
}
