//! Injected log sink.
//!
//! The codec never reaches for a global logger. Callers pass a [`Logger`];
//! [`NoopLogger`] is used when they don't.

use std::sync::Mutex;

/// Leveled message sink used for progress and skip reporting.
pub trait Logger {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Forwards messages to `tracing` events under the `baler` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!(target: "baler", "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "baler", "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "baler", "{}", msg);
    }
}

/// Severity of a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: LogLevel, msg: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, msg.to_string()));
        }
    }

    /// All recorded entries in emission order.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(LogLevel::Info)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(LogLevel::Warn)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }
}

impl Logger for MemoryLogger {
    fn info(&self, msg: &str) {
        self.push(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(LogLevel::Error, msg);
    }
}

/// Applies the `verbose` switch: info is dropped unless enabled, warnings
/// always pass.
pub(crate) struct RunLog<'a> {
    sink: &'a dyn Logger,
    verbose: bool,
}

impl<'a> RunLog<'a> {
    pub(crate) fn new(sink: &'a dyn Logger, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    pub(crate) fn info(&self, msg: impl FnOnce() -> String) {
        if self.verbose {
            self.sink.info(&msg());
        }
    }

    pub(crate) fn warn(&self, msg: &str) {
        self.sink.warn(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.info("one");
        logger.warn("two");
        logger.error("three");

        assert_eq!(logger.infos(), vec!["one"]);
        assert_eq!(logger.warnings(), vec!["two"]);
        assert_eq!(logger.errors(), vec!["three"]);
        assert_eq!(logger.entries().len(), 3);
    }

    #[test]
    fn test_run_log_gates_info_on_verbose() {
        let logger = MemoryLogger::new();

        RunLog::new(&logger, false).info(|| "hidden".to_string());
        RunLog::new(&logger, false).warn("shown");
        RunLog::new(&logger, true).info(|| "visible".to_string());

        assert_eq!(logger.infos(), vec!["visible"]);
        assert_eq!(logger.warnings(), vec!["shown"]);
    }

    #[test]
    fn test_noop_logger_is_silent() {
        let logger = NoopLogger;
        logger.info("x");
        logger.warn("y");
        logger.error("z");
    }
}
