//! Tree encoder: walks a source directory and writes accepted files as frames
//! into rotating shards.

use crate::filter::PathFilter;
use crate::frame;
use crate::gate::{self, Rejection};
use crate::logger::{Logger, NoopLogger, RunLog};
use crate::shard::{self, ShardAllocator};
use crate::{BalerError, BundleConfig, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Relative paths bundled by one encode run, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProcessedFileList(Vec<String>);

impl ProcessedFileList {
    fn push(&mut self, relative_path: String) {
        self.0.push(relative_path);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.0.iter().any(|p| p == relative_path)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ProcessedFileList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ProcessedFileList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Entries left out of the bundle, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub excluded: u64,
    pub too_large: u64,
    pub too_many_lines: u64,
    pub invalid_utf8: u64,
    pub unrepresentable: u64,
    pub special: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.excluded
            + self.too_large
            + self.too_many_lines
            + self.invalid_utf8
            + self.unrepresentable
            + self.special
    }

    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::TooLarge => self.too_large += 1,
            Rejection::TooManyLines => self.too_many_lines += 1,
            Rejection::InvalidUtf8 => self.invalid_utf8 += 1,
        }
    }
}

/// Everything an encode run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EncodeReport {
    pub processed: ProcessedFileList,
    pub shards: Vec<PathBuf>,
    pub skipped: SkipCounts,
    pub bytes_written: u64,
}

/// Packs a directory tree into shards.
pub struct Encoder<'a> {
    config: &'a BundleConfig,
    logger: &'a dyn Logger,
}

impl<'a> Encoder<'a> {
    pub fn new(config: &'a BundleConfig) -> Self {
        Self {
            config,
            logger: &NoopLogger,
        }
    }

    pub fn with_logger(mut self, logger: &'a dyn Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Encode `source_root` into shards under `dest_dir`.
    pub fn encode(&self, source_root: &Path, dest_dir: &Path) -> Result<ProcessedFileList> {
        self.encode_report(source_root, dest_dir)
            .map(|report| report.processed)
    }

    /// Like [`Encoder::encode`], also returning shard paths and skip counts.
    ///
    /// The aborting error is returned, not logged.
    pub fn encode_report(&self, source_root: &Path, dest_dir: &Path) -> Result<EncodeReport> {
        let log = RunLog::new(self.logger, self.config.verbose);
        self.run(source_root, dest_dir, &log)
    }

    fn run(&self, source_root: &Path, dest_dir: &Path, log: &RunLog<'_>) -> Result<EncodeReport> {
        let config = self.config;
        config.validate()?;
        let filter = PathFilter::new(&config.exclusion_patterns)?;
        let dest_guard = DestGuard::new(source_root, dest_dir);

        let mut allocator = ShardAllocator::new(dest_dir, config.max_output_size);
        let mut report = EncodeReport::default();
        let mut pending = vec![source_root.to_path_buf()];

        log.info(|| format!("converting {} into {}", source_root.display(), dest_dir.display()));

        while let Some(dir) = pending.pop() {
            let in_dest = dest_guard.is_dest(&dir);

            for entry in sorted_entries(&dir)? {
                let abs_path = entry.path();
                let relative = abs_path.strip_prefix(source_root).map_err(|_| {
                    BalerError::internal(format!(
                        "{} is not below {}",
                        abs_path.display(),
                        source_root.display()
                    ))
                })?;
                let Some(key) = frame::relative_key(relative) else {
                    log.warn(&format!(
                        "skipping {}: name is not valid UTF-8",
                        abs_path.display()
                    ));
                    report.skipped.unrepresentable += 1;
                    continue;
                };

                if let Some(pattern) = filter.matching_pattern(&key) {
                    log.info(|| format!("excluded {key} (pattern '{pattern}')"));
                    report.skipped.excluded += 1;
                    continue;
                }

                let file_type = entry.file_type().map_err(|e| {
                    BalerError::io(format!("failed to stat {}", abs_path.display()), e)
                })?;

                if file_type.is_dir() {
                    if dest_guard.is_dest(&abs_path) {
                        log.info(|| format!("skipping output directory {key}"));
                        continue;
                    }
                    pending.push(abs_path);
                    continue;
                }

                if !file_type.is_file() {
                    log.info(|| format!("skipping {key}: not a regular file"));
                    report.skipped.special += 1;
                    continue;
                }

                if in_dest && shard::parse_shard_index(&key_file_name(&key)).is_some() {
                    log.info(|| format!("skipping shard {key} in output directory"));
                    continue;
                }

                if !frame::is_representable(&key) {
                    log.warn(&format!(
                        "skipping {key:?}: path cannot be represented in a frame header"
                    ));
                    report.skipped.unrepresentable += 1;
                    continue;
                }

                let header_len = frame::header_line_len(&config.delimiter, &key);
                if header_len > config.effective_buffer_size() {
                    log.warn(&format!(
                        "skipping {key}: frame header of {header_len} bytes exceeds the scan buffer of {} bytes",
                        config.effective_buffer_size()
                    ));
                    report.skipped.unrepresentable += 1;
                    continue;
                }

                let outcome = gate::validate(&abs_path, config)?;
                if let Some(rejection) = outcome.rejection() {
                    log.info(|| format!("skipped {key}: {rejection}"));
                    report.skipped.record(rejection);
                    continue;
                }
                if outcome.delimiter_collisions > 0 {
                    log.warn(&format!(
                        "{key} has {} line(s) starting with the delimiter; unconvert will split it there",
                        outcome.delimiter_collisions
                    ));
                }

                let frame_len = frame::frame_len(&config.delimiter, &key, outcome.size_bytes);
                if allocator.current_index().is_none() || allocator.needs_rotation(frame_len)? {
                    let path = allocator.rotate()?;
                    log.info(|| format!("writing to shard {}", path.display()));
                }

                let mut source = File::open(&abs_path).map_err(|e| {
                    BalerError::io(format!("failed to open source file {}", abs_path.display()), e)
                })?;
                let header = frame::header(&config.delimiter, &key);
                report.bytes_written += allocator.write_frame(header.as_bytes(), &mut source)?;

                log.info(|| format!("added {key} ({} bytes)", outcome.size_bytes));
                report.processed.push(key);
            }
        }

        report.shards = allocator.finish();
        log.info(|| {
            format!(
                "converted {} file(s) into {} shard(s), skipped {}",
                report.processed.len(),
                report.shards.len(),
                report.skipped.total()
            )
        });
        Ok(report)
    }
}

fn key_file_name(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

/// Directory entries of `dir` in byte order of their names.
fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let read_dir = fs::read_dir(dir)
        .map_err(|e| BalerError::io(format!("failed to list {}", dir.display()), e))?;
    let mut entries = read_dir
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| BalerError::io(format!("failed to list {}", dir.display()), e))?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Recognizes the destination directory when it lies inside the source tree,
/// so the encoder never reads its own shards.
struct DestGuard {
    dest: Option<PathBuf>,
}

impl DestGuard {
    fn new(source_root: &Path, dest_dir: &Path) -> Self {
        let dest = match (fs::canonicalize(source_root), fs::canonicalize(dest_dir)) {
            (Ok(source), Ok(dest)) if dest.starts_with(&source) => Some(dest),
            _ => None,
        };
        Self { dest }
    }

    fn is_dest(&self, dir: &Path) -> bool {
        match &self.dest {
            Some(dest) => fs::canonicalize(dir).map(|d| &d == dest).unwrap_or(false),
            None => false,
        }
    }
}

/// Encode `source_path` into shards under `dest_dir`.
///
/// Both directories must already exist.
pub fn convert(
    source_path: &Path,
    dest_dir: &Path,
    config: &BundleConfig,
    logger: &dyn Logger,
) -> Result<ProcessedFileList> {
    convert_report(source_path, dest_dir, config, logger).map(|r| r.processed)
}

/// [`convert`] returning the full [`EncodeReport`].
pub fn convert_report(
    source_path: &Path,
    dest_dir: &Path,
    config: &BundleConfig,
    logger: &dyn Logger,
) -> Result<EncodeReport> {
    require_dir(source_path, "source")?;
    require_dir(dest_dir, "destination")?;
    Encoder::new(config)
        .with_logger(logger)
        .encode_report(source_path, dest_dir)
}

pub(crate) fn require_dir(path: &Path, role: &str) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(BalerError::validation(format!(
            "{role} path {} is not a directory",
            path.display()
        ))),
        Err(e) => Err(BalerError::validation_with(
            format!("{role} directory {} not found", path.display()),
            e,
        )),
    }
}
