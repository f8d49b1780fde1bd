//! Exit codes and error presentation for the `baler` binary.
//!
//! Every codec failure exits with [`ExitCode::Failure`]; the error kind is
//! conveyed by the message prefix on stderr. Usage errors are reported by
//! clap itself and exit with status 2.

use baler_core::{BalerError, ErrorKind};
use std::error::Error as _;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed.
    Clean = 0,

    /// Command aborted with an error.
    Failure = 1,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// User-facing prefix for an error kind.
pub fn error_prefix(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "Validation error",
        ErrorKind::Io => "I/O error",
        ErrorKind::Config => "Configuration error",
        ErrorKind::Internal => "Internal error",
    }
}

/// `<prefix>: <message>[: <cause>]...` for stderr.
pub fn render_error(err: &BalerError) -> String {
    let mut out = format!("{}: {}", error_prefix(err.kind()), err);
    let mut cause = err.source();
    while let Some(inner) = cause {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        cause = inner.source();
    }
    out
}
