//! Shard decoder: splits shards back into the files they were built from.

use crate::encoder::require_dir;
use crate::frame;
use crate::logger::{Logger, NoopLogger, RunLog};
use crate::scan::{LineScanner, SplitMode};
use crate::shard;
use crate::{BalerError, BundleConfig, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// What a decode run read and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeReport {
    pub shards_read: Vec<PathBuf>,
    /// Destination-relative paths, one per frame, in decode order.
    pub files_written: Vec<PathBuf>,
}

/// Rebuilds a tree from shards.
pub struct Decoder<'a> {
    config: &'a BundleConfig,
    logger: &'a dyn Logger,
}

impl<'a> Decoder<'a> {
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

    /// Decode every shard in `shard_dir` into `dest_dir`.
    pub fn decode(&self, shard_dir: &Path, dest_dir: &Path) -> Result<()> {
        self.decode_report(shard_dir, dest_dir).map(|_| ())
    }

    pub fn decode_report(&self, shard_dir: &Path, dest_dir: &Path) -> Result<DecodeReport> {
        let log = RunLog::new(self.logger, self.config.verbose);
        self.run(shard_dir, dest_dir, &log)
    }

    /// Decode a single shard stream into `dest_dir`, returning the
    /// destination-relative paths written.
    pub fn decode_stream<R: BufRead>(&self, reader: R, dest_dir: &Path) -> Result<Vec<PathBuf>> {
        self.config.validate()?;
        let log = RunLog::new(self.logger, self.config.verbose);
        let mut written = Vec::new();
        self.demux(reader, dest_dir, &log, &mut written)?;
        Ok(written)
    }

    fn run(&self, shard_dir: &Path, dest_dir: &Path, log: &RunLog<'_>) -> Result<DecodeReport> {
        self.config.validate()?;
        let shards = shard_entries(shard_dir, log)?;
        if shards.is_empty() {
            return Err(BalerError::validation(format!(
                "no shards found in {}",
                shard_dir.display()
            )));
        }

        let mut report = DecodeReport::default();
        for shard_path in shards {
            log.info(|| format!("reading shard {}", shard_path.display()));
            let file = File::open(&shard_path).map_err(|e| {
                BalerError::io(format!("failed to open shard {}", shard_path.display()), e)
            })?;
            self.demux(BufReader::new(file), dest_dir, log, &mut report.files_written)
                .map_err(|e| with_shard_context(&shard_path, e))?;
            report.shards_read.push(shard_path);
        }

        log.info(|| {
            format!(
                "restored {} file(s) from {} shard(s)",
                report.files_written.len(),
                report.shards_read.len()
            )
        });
        Ok(report)
    }

    fn demux<R: BufRead>(
        &self,
        reader: R,
        dest_dir: &Path,
        log: &RunLog<'_>,
        written: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let delimiter = self.config.delimiter.as_str();
        let mut scanner = LineScanner::new(
            reader,
            self.config.effective_buffer_size(),
            SplitMode::Exact,
        );
        let mut current: Option<OutputFile> = None;

        while let Some(line) = scanner.next_line()? {
            if let Some(raw_path) = frame::parse_delimiter_line(line, delimiter) {
                if let Some(open) = current.take() {
                    open.finish()?;
                }
                let relative = frame::validate_frame_path(raw_path)?;
                let target = dest_dir.join(&relative);
                log.info(|| format!("writing {}", relative.display()));
                current = Some(OutputFile::create(target)?);
                written.push(relative);
                continue;
            }
            if let Some(open) = current.as_mut() {
                open.write_line(line)?;
            }
        }

        if let Some(open) = current.take() {
            open.finish()?;
        }
        Ok(())
    }
}

/// Destination file of the frame being decoded.
struct OutputFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OutputFile {
    fn create(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BalerError::io(format!("failed to create directory {}", parent.display()), e)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| BalerError::io(format!("failed to create {}", path.display()), e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer
            .write_all(line)
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(|e| BalerError::io(format!("failed to write {}", self.path.display()), e))
    }

    /// Flush, drop the newline that precedes the next frame header (or the
    /// end of the shard), and close.
    fn finish(self) -> Result<()> {
        let Self { path, writer } = self;
        let io_err = |what: &str, e: std::io::Error| {
            BalerError::io(format!("failed to {what} {}", path.display()), e)
        };

        let mut file = writer
            .into_inner()
            .map_err(|e| io_err("flush", e.into_error()))?;
        let len = file.metadata().map_err(|e| io_err("stat", e))?.len();
        if len == 0 {
            return Ok(());
        }

        file.seek(SeekFrom::End(-1)).map_err(|e| io_err("seek", e))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).map_err(|e| io_err("read", e))?;
        if last[0] == b'\n' {
            file.set_len(len - 1).map_err(|e| io_err("truncate", e))?;
        }
        Ok(())
    }
}

fn with_shard_context(shard: &Path, err: BalerError) -> BalerError {
    let context = |message: String| format!("{}: {message}", shard.display());
    match err {
        BalerError::Io { message, source } => BalerError::Io {
            message: context(message),
            source,
        },
        BalerError::Validation { message, source } => BalerError::Validation {
            message: context(message),
            source,
        },
        other => other,
    }
}

/// Shard files of `dir`: `output_<n>.txt` by index first, then any other file
/// by name.
fn shard_entries(dir: &Path, log: &RunLog<'_>) -> Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir)
        .map_err(|e| BalerError::io(format!("failed to list {}", dir.display()), e))?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry =
            entry.map_err(|e| BalerError::io(format!("failed to list {}", dir.display()), e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| BalerError::io(format!("failed to stat {}", path.display()), e))?;
        if file_type.is_dir() {
            log.warn(&format!("skipping directory {} among shards", path.display()));
            continue;
        }
        let index = entry
            .file_name()
            .to_str()
            .and_then(shard::parse_shard_index)
            .and_then(|parsed| parsed.ok());
        files.push((index, path));
    }

    files.sort_by(|(ia, pa), (ib, pb)| match (ia, ib) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => pa.file_name().cmp(&pb.file_name()),
    });
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Decode every shard in `shard_dir` into `dest_dir`.
///
/// Both directories must exist and `shard_dir` must contain at least one
/// shard.
pub fn unconvert(
    shard_dir: &Path,
    dest_dir: &Path,
    config: &BundleConfig,
    logger: &dyn Logger,
) -> Result<()> {
    unconvert_report(shard_dir, dest_dir, config, logger).map(|_| ())
}

/// [`unconvert`] returning the full [`DecodeReport`].
pub fn unconvert_report(
    shard_dir: &Path,
    dest_dir: &Path,
    config: &BundleConfig,
    logger: &dyn Logger,
) -> Result<DecodeReport> {
    require_dir(shard_dir, "shard")?;
    require_dir(dest_dir, "destination")?;
    Decoder::new(config)
        .with_logger(logger)
        .decode_report(shard_dir, dest_dir)
}
