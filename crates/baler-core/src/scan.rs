//! Bounded line scanning.
//!
//! Both the file gate and the decoder read line by line with a hard cap on
//! line length so a single pathological line cannot exhaust memory.

use crate::{BalerError, Result};
use std::io::BufRead;

/// Initial line buffer capacity.
const INITIAL_CAPACITY: usize = 64 * 1024;

/// How the input is cut into lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Conventional lines: a trailing `\n` does not open another line.
    Lines,
    /// Exact `\n`-separated segments: input ending in `\n` yields a final
    /// empty segment, so joining segments with `\n` restores the input.
    Exact,
}

/// Reads `\n`-terminated lines, rejecting any line whose content (terminator
/// excluded) is longer than `max_line` bytes.
///
/// Measuring content only keeps the limit independent of whether a line is
/// terminated, so a file's last line scans the same once it is framed.
pub struct LineScanner<R> {
    reader: R,
    max_line: usize,
    mode: SplitMode,
    buf: Vec<u8>,
    line_no: u64,
    last_terminated: bool,
    done: bool,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R, max_line: u64, mode: SplitMode) -> Self {
        let max_line = usize::try_from(max_line).unwrap_or(usize::MAX).max(1);
        Self {
            reader,
            max_line,
            mode,
            buf: Vec::with_capacity(INITIAL_CAPACITY.min(max_line)),
            line_no: 0,
            last_terminated: false,
            done: false,
        }
    }

    /// Number of lines returned so far.
    pub fn line_number(&self) -> u64 {
        self.line_no
    }

    /// Next line without its `\n`, or `None` at end of input.
    ///
    /// Carriage returns are part of the line.
    pub fn next_line(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }
        self.buf.clear();

        let mut terminated = false;
        loop {
            let available = match self.reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(BalerError::io(
                        format!("failed to read line {}", self.line_no + 1),
                        e,
                    ))
                }
            };
            if available.is_empty() {
                break;
            }

            let (take, found) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            };
            let content_len = self.buf.len() + take - usize::from(found);
            if content_len > self.max_line {
                return Err(BalerError::io_msg(format!(
                    "line {} exceeds the scan buffer of {} bytes",
                    self.line_no + 1,
                    self.max_line
                )));
            }

            self.buf.extend_from_slice(&available[..take]);
            self.reader.consume(take);
            if found {
                terminated = true;
                break;
            }
        }

        if terminated {
            self.buf.pop();
            self.last_terminated = true;
        } else if self.buf.is_empty() {
            // End of input.
            self.done = true;
            let emit_trailing = self.mode == SplitMode::Exact
                && (self.last_terminated || self.line_no == 0);
            if !emit_trailing {
                return Ok(None);
            }
        } else {
            self.done = true;
        }

        self.line_no += 1;
        Ok(Some(&self.buf))
    }
}
