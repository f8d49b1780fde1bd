//! Error types for shard encoding and decoding.
//!
//! Every failure is one of four kinds. Callers branch on [`BalerError::kind`]
//! instead of inspecting messages.

use thiserror::Error;

/// Boxed underlying cause carried by non-IO variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a [`BalerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input path, empty source, malformed pattern or shard listing.
    Validation,
    /// stat/open/read/write/seek/truncate failures.
    Io,
    /// Contradictory or unusable configuration.
    Config,
    /// Unexpected invariant violation.
    Internal,
}

impl ErrorKind {
    /// Stable lowercase name (for JSON output).
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while converting or unconverting a tree.
#[derive(Error, Debug)]
pub enum BalerError {
    /// Invalid input supplied by the caller.
    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Filesystem failure.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration contradiction.
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Broken internal invariant.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl BalerError {
    pub fn validation(message: impl Into<String>) -> Self {
        BalerError::Validation {
            message: message.into(),
            source: None,
        }
    }

    pub fn validation_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        BalerError::Validation {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        BalerError::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// IO-class failure without an underlying `std::io::Error`.
    pub fn io_msg(message: impl Into<String>) -> Self {
        BalerError::Io {
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        BalerError::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        BalerError::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BalerError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BalerError::Validation { .. } => ErrorKind::Validation,
            BalerError::Io { .. } => ErrorKind::Io,
            BalerError::Config { .. } => ErrorKind::Config,
            BalerError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// The human-readable message, without the cause.
    pub fn message(&self) -> &str {
        match self {
            BalerError::Validation { message, .. }
            | BalerError::Io { message, .. }
            | BalerError::Config { message, .. }
            | BalerError::Internal { message, .. } => message,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_io(&self) -> bool {
        self.kind() == ErrorKind::Io
    }
}

/// Result type alias for baler operations.
pub type Result<T> = std::result::Result<T, BalerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(BalerError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(BalerError::io_msg("x").kind(), ErrorKind::Io);
        assert_eq!(BalerError::config("x").kind(), ErrorKind::Config);
        assert_eq!(BalerError::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_display_is_message_and_source_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = BalerError::io("failed to open shard", io);

        assert_eq!(err.to_string(), "failed to open shard");
        assert_eq!(err.message(), "failed to open shard");
        assert_eq!(err.source().unwrap().to_string(), "gone");
        assert!(err.is_io());
    }

    #[test]
    fn test_validation_with_boxed_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "bad glob");
        let err = BalerError::validation_with("invalid exclusion pattern", cause);

        assert!(err.is_validation());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Validation.to_string(), "validation");
        assert_eq!(ErrorKind::Io.as_str(), "io");
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }
}
