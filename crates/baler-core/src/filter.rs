//! Exclusion patterns.
//!
//! Patterns are shell globs matched against the whole `/`-separated relative
//! path. `*` and `?` never cross a separator, so `node_modules/*` matches
//! `node_modules/pkg` while `node_modules*` does not.

use crate::{BalerError, Result};
use globset::{GlobBuilder, GlobMatcher};

/// Ordered, pre-compiled exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<(String, GlobMatcher)>,
}

impl PathFilter {
    /// Compile `patterns`, failing on the first malformed one.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                compile(p).map(|m| (p.to_string(), m))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// The first pattern matching `relative_path`, if any.
    pub fn matching_pattern(&self, relative_path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, m)| m.is_match(relative_path))
            .map(|(p, _)| p.as_str())
    }

    pub fn should_ignore(&self, relative_path: &str) -> bool {
        self.matching_pattern(relative_path).is_some()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| {
            BalerError::validation_with(format!("invalid exclusion pattern '{pattern}'"), e)
        })
}

/// One-shot form: compile `patterns` and test a single path.
pub fn should_ignore<S: AsRef<str>>(relative_path: &str, patterns: &[S]) -> Result<bool> {
    Ok(PathFilter::new(patterns)?.should_ignore(relative_path))
}
