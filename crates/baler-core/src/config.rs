//! Run configuration shared by the encoder and decoder.

use crate::{BalerError, Result};
use serde::{Deserialize, Serialize};

/// Default frame marker.
pub const DEFAULT_DELIMITER: &str = "// filename: ";

/// Default maximum number of lines in a bundled file.
pub const DEFAULT_MAX_INPUT_LINES: u64 = 10_000;

/// Default maximum size of a bundled file (1 MiB).
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 1024 * 1024;

/// Default maximum size of a shard (5 MiB).
pub const DEFAULT_MAX_OUTPUT_SIZE: u64 = 5 * 1024 * 1024;

/// Limits and framing options for one encode or decode run.
///
/// A run borrows the config immutably for its whole duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Files with more lines than this are skipped.
    pub max_input_lines: u64,

    /// Files larger than this (bytes) are skipped.
    pub max_input_size: u64,

    /// Shards rotate before exceeding this size (bytes).
    pub max_output_size: u64,

    /// Longest scannable line, terminator excluded. Falls back to
    /// `max_input_size` when unset.
    pub buffer_size: Option<u64>,

    /// Glob patterns matched against `/`-separated relative paths.
    pub exclusion_patterns: Vec<String>,

    /// Frame marker written before every relative path.
    pub delimiter: String,

    /// Emit info-level progress through the injected logger.
    pub verbose: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            max_input_lines: DEFAULT_MAX_INPUT_LINES,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            buffer_size: None,
            exclusion_patterns: Vec::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            verbose: false,
        }
    }
}

impl BundleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_input_lines(mut self, lines: u64) -> Self {
        self.max_input_lines = lines;
        self
    }

    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.max_input_size = bytes;
        self
    }

    pub fn with_max_output_size(mut self, bytes: u64) -> Self {
        self.max_output_size = bytes;
        self
    }

    /// Set the scan buffer size. Zero means "unset".
    pub fn with_buffer_size(mut self, bytes: u64) -> Self {
        self.buffer_size = (bytes > 0).then_some(bytes);
        self
    }

    pub fn with_exclusions<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusion_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Longest line (terminator excluded) the scanner accepts.
    pub fn effective_buffer_size(&self) -> u64 {
        match self.buffer_size {
            Some(size) if size > 0 => size,
            _ => self.max_input_size,
        }
    }

    /// Checks shared by both directions.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(BalerError::config("delimiter must not be empty"));
        }
        if self.delimiter.contains(['\n', '\r']) {
            return Err(BalerError::config(
                "delimiter must not contain a line break",
            ));
        }
        if self.effective_buffer_size() == 0 {
            return Err(BalerError::config(
                "scan buffer size is zero (set max buffer size or max input size)",
            ));
        }
        Ok(())
    }

    /// Checks that only make sense when encoding.
    pub fn validate_for_encode(&self) -> Result<()> {
        self.validate()?;
        if self.max_input_size >= self.max_output_size {
            return Err(BalerError::config(format!(
                "max input file size ({}) must be smaller than max output file size ({})",
                self.max_input_size, self.max_output_size
            )));
        }
        Ok(())
    }
}
