//! Shard allocation and rotation.
//!
//! Shards are named `output_<n>.txt`. Indices already present in the
//! destination directory are never reused, so shards left by an earlier or
//! concurrent run are not clobbered.

use crate::{BalerError, Result};
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SHARD_PREFIX: &str = "output_";
pub const SHARD_SUFFIX: &str = ".txt";

/// File name of the shard with `index`.
pub fn shard_file_name(index: u64) -> String {
    format!("{SHARD_PREFIX}{index}{SHARD_SUFFIX}")
}

/// Parse the index out of a shard file name.
///
/// `None` when `name` does not have the shard shape at all, `Some(Err)` when it
/// does but the index is not a non-negative base-10 integer.
pub fn parse_shard_index(name: &str) -> Option<Result<u64>> {
    let digits = name.strip_prefix(SHARD_PREFIX)?.strip_suffix(SHARD_SUFFIX)?;
    let parsed = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse::<u64>().map_err(|e| {
            BalerError::validation_with(
                format!("encountered invalid file in output directory: {name}"),
                e,
            )
        })
    } else {
        Err(BalerError::validation(format!(
            "encountered invalid file in output directory: {name}"
        )))
    };
    Some(parsed)
}

/// Indices of the shard files currently in `dir`.
pub fn existing_shard_indices(dir: &Path) -> Result<BTreeSet<u64>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        BalerError::io(
            format!("unable to read output directory {}", dir.display()),
            e,
        )
    })?;

    let mut indices = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BalerError::io(format!("unable to list {}", dir.display()), e)
        })?;
        let file_type = entry.file_type().map_err(|e| {
            BalerError::io(format!("unable to stat {}", entry.path().display()), e)
        })?;
        if file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(index) = parse_shard_index(name) {
            indices.insert(index?);
        }
    }
    Ok(indices)
}

/// Smallest index not present in `dir` that is greater than `after`
/// (or at least zero when there is no previous index).
pub fn next_free_index(dir: &Path, after: Option<u64>) -> Result<u64> {
    let taken = existing_shard_indices(dir)?;
    let mut candidate = match after {
        Some(last) => last
            .checked_add(1)
            .ok_or_else(|| BalerError::internal("shard index space exhausted"))?,
        None => 0,
    };
    while taken.contains(&candidate) {
        candidate = candidate
            .checked_add(1)
            .ok_or_else(|| BalerError::internal("shard index space exhausted"))?;
    }
    Ok(candidate)
}

struct OpenShard {
    index: u64,
    path: PathBuf,
    file: File,
}

/// Owns the single open output shard of an encode run.
pub struct ShardAllocator {
    dest_dir: PathBuf,
    max_output_size: u64,
    last_index: Option<u64>,
    current: Option<OpenShard>,
    shards: Vec<PathBuf>,
}

impl ShardAllocator {
    pub fn new(dest_dir: impl Into<PathBuf>, max_output_size: u64) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            max_output_size,
            last_index: None,
            current: None,
            shards: Vec::new(),
        }
    }

    /// Size of the open shard as reported by the filesystem.
    pub fn current_size(&self) -> Result<u64> {
        match &self.current {
            Some(shard) => shard
                .file
                .metadata()
                .map(|m| m.len())
                .map_err(|e| BalerError::io(format!("failed to stat {}", shard.path.display()), e)),
            None => Ok(0),
        }
    }

    pub fn current_index(&self) -> Option<u64> {
        self.current.as_ref().map(|s| s.index)
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|s| s.path.as_path())
    }

    /// Whether writing `frame_len` more bytes would push the open shard past
    /// the cap. An empty or missing shard never needs rotation: a frame larger
    /// than the cap still goes whole into a fresh shard.
    pub fn needs_rotation(&self, frame_len: u64) -> Result<bool> {
        if self.current.is_none() {
            return Ok(false);
        }
        let size = self.current_size()?;
        Ok(size > 0 && size.saturating_add(frame_len) > self.max_output_size)
    }

    /// Close the open shard (if any) and open the next free one.
    pub fn rotate(&mut self) -> Result<&Path> {
        self.current = None;

        let mut after = self.last_index;
        loop {
            let index = next_free_index(&self.dest_dir, after)?;
            let path = self.dest_dir.join(shard_file_name(index));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    self.last_index = Some(index);
                    self.shards.push(path.clone());
                    let shard = self.current.insert(OpenShard { index, path, file });
                    return Ok(shard.path.as_path());
                }
                // Taken between the directory scan and the open.
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => after = Some(index),
                Err(e) => {
                    return Err(BalerError::io(
                        format!("failed to create shard {}", path.display()),
                        e,
                    ))
                }
            }
        }
    }

    /// Append one frame (header, then the whole of `content`) to the open
    /// shard, opening the first shard if needed. Returns the bytes written.
    pub fn write_frame<R: Read>(&mut self, header: &[u8], content: &mut R) -> Result<u64> {
        if self.current.is_none() {
            self.rotate()?;
        }
        let shard = self
            .current
            .as_mut()
            .ok_or_else(|| BalerError::internal("no open shard after rotation"))?;

        let path = &shard.path;
        let write_err = |e: std::io::Error| {
            BalerError::io(format!("failed to write to shard {}", path.display()), e)
        };

        let mut writer = BufWriter::new(&mut shard.file);
        writer.write_all(header).map_err(write_err)?;
        let copied = std::io::copy(content, &mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;

        Ok(header.len() as u64 + copied)
    }

    /// Shards opened by this allocator, in allocation order.
    pub fn shards(&self) -> &[PathBuf] {
        &self.shards
    }

    /// Close the open shard and return every shard path written.
    pub fn finish(mut self) -> Vec<PathBuf> {
        self.current = None;
        self.shards
    }
}
