//! Command payloads written to stdout.

use baler_core::{DecodeReport, EncodeReport, SkipCounts};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Supported payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Short human-readable summary (default).
    #[default]
    Human,
    /// One JSON document.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Timing shared by every payload.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunInfo {
    pub fn start(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
        }
    }

    fn duration_ms(&self) -> u64 {
        (Utc::now() - self.started_at)
            .num_milliseconds()
            .try_into()
            .unwrap_or(0)
    }
}

/// `convert` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub command: &'static str,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub processed_files: Vec<String>,
    pub shards: Vec<PathBuf>,
    pub skipped: SkipCounts,
}

impl ConvertSummary {
    pub fn new(run: &RunInfo, report: EncodeReport) -> Self {
        Self {
            command: "convert",
            run_id: run.run_id.clone(),
            started_at: run.started_at,
            duration_ms: run.duration_ms(),
            processed_files: report.processed.into_vec(),
            shards: report.shards,
            skipped: report.skipped,
        }
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
            OutputFormat::Human => Ok(format!(
                "Conversion successful!\n{} file(s) written to {} shard(s), {} skipped",
                self.processed_files.len(),
                self.shards.len(),
                self.skipped.total()
            )),
        }
    }
}

/// `unconvert` payload.
#[derive(Debug, Clone, Serialize)]
pub struct UnconvertSummary {
    pub command: &'static str,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub shards_read: Vec<PathBuf>,
    pub files_written: Vec<PathBuf>,
}

impl UnconvertSummary {
    pub fn new(run: &RunInfo, report: DecodeReport) -> Self {
        Self {
            command: "unconvert",
            run_id: run.run_id.clone(),
            started_at: run.started_at,
            duration_ms: run.duration_ms(),
            shards_read: report.shards_read,
            files_written: report.files_written,
        }
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self),
            OutputFormat::Human => Ok(format!(
                "Un-conversion successful!\n{} file(s) restored from {} shard(s)",
                self.files_written.len(),
                self.shards_read.len()
            )),
        }
    }
}

/// `version` payload.
pub fn render_version(format: OutputFormat) -> serde_json::Result<String> {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "command": "version",
            "version": version,
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
        })),
        OutputFormat::Human => Ok(format!("baler {version}")),
    }
}
