//! Pack a text source tree into size-bounded shard files and back.
//!
//! A shard (`output_<n>.txt`) is a plain concatenation of frames, one per
//! bundled file:
//!
//! ```text
//! \n<delimiter><relative path>\n<raw file bytes>
//! ```
//!
//! # Encoding
//!
//! The encoder walks the source tree depth-first, drops paths matching an
//! exclusion pattern, admits files through the size / line-count / UTF-8
//! gate, and appends each accepted file to the current shard, rotating to a
//! fresh shard before the size cap would be exceeded.
//!
//! # Decoding
//!
//! The decoder reads shards line by line and writes each frame's content to
//! its relative path under the destination directory.
//!
//! # Example
//!
//! ```no_run
//! use baler_core::{convert, unconvert, BundleConfig, TracingLogger};
//! use std::path::Path;
//!
//! let config = BundleConfig::new()
//!     .with_exclusions(["node_modules/*", "*.lock"])
//!     .with_verbose(true);
//!
//! let processed = convert(Path::new("src"), Path::new("shards"), &config, &TracingLogger).unwrap();
//! println!("bundled {} files", processed.len());
//!
//! unconvert(Path::new("shards"), Path::new("restored"), &config, &TracingLogger).unwrap();
//! ```

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod frame;
pub mod gate;
pub mod logger;
pub mod scan;
pub mod shard;

pub use config::{
    BundleConfig, DEFAULT_DELIMITER, DEFAULT_MAX_INPUT_LINES, DEFAULT_MAX_INPUT_SIZE,
    DEFAULT_MAX_OUTPUT_SIZE,
};
pub use decoder::{unconvert, unconvert_report, DecodeReport, Decoder};
pub use encoder::{convert, convert_report, EncodeReport, Encoder, ProcessedFileList, SkipCounts};
pub use error::{BalerError, ErrorKind, Result};
pub use filter::{should_ignore, PathFilter};
pub use gate::{Rejection, ValidationOutcome};
pub use logger::{LogLevel, Logger, MemoryLogger, NoopLogger, TracingLogger};
pub use scan::{LineScanner, SplitMode};
