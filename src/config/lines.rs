//! Turns the physical lines of a config file into logical lines.
//!
//! Comments and blank lines are dropped, `IGNORE_START` ... `IGNORE_STOP`
//! blocks are skipped, lines ending in a backslash are joined with the lines
//! that follow them, and the line closing an open verb block is reported
//! separately so the reader can finish the pending entry.

use std::{
    io,
    path::{Path, PathBuf},
};

use regex::Regex;
use tracing::trace;

use super::error::{EntryError, ParseError};


pub const IGNORE_BLOCK_START: &str = "IGNORE_START";
pub const IGNORE_BLOCK_STOP: &str = "IGNORE_STOP";
pub const LINE_CONTINUATION: char = '\\';
pub const COMMENT_START: char = '#';


/// What the reader should do next.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LineEvent {
    /// A complete logical line. `raw` is the first physical line it was
    /// built from, stripped of surrounding whitespace.
    Logical {
        line: String,
        raw: String,
        line_number: usize,
    },

    /// The line matching the end marker of the open verb block.
    BlockEnd { raw: String, line_number: usize },
}


/// Case-insensitive check for a directive keyword at the start of `line`.
pub(crate) fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.get(..keyword.len())
        .is_some_and(|start| start.eq_ignore_ascii_case(keyword))
}


/// Streams [`LineEvent`]s out of a source of physical lines.
pub struct LogicalLines<I> {
    path: PathBuf,
    lines: I,
    line_number: usize,
}

impl<I> LogicalLines<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    /// `path` is only used to attribute read errors.
    pub fn new<P: AsRef<Path>>(path: P, lines: I) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lines,
            line_number: 0,
        }
    }

    /// Number of physical lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_physical(&mut self) -> Result<Option<String>, ParseError> {
        match self.lines.next() {
            Some(Ok(line)) => {
                self.line_number += 1;
                trace!(line_number = self.line_number, "Config line: {}", line);
                Ok(Some(line))
            }
            Some(Err(error)) => Err(ParseError::io(&self.path, error)),
            None => Ok(None),
        }
    }

    /// Consume lines up to and including the one starting with
    /// `IGNORE_STOP`. Returns `false` if the file ended first.
    fn skip_ignore_block(&mut self) -> Result<bool, ParseError> {
        while let Some(line) = self.next_physical()? {
            if starts_with_keyword(line.trim(), IGNORE_BLOCK_STOP) {
                return Ok(true);
            }
        }

        trace!("Ignore block runs to end of file");
        Ok(false)
    }

    /// Produce the next event, or `None` at the end of the file.
    ///
    /// `end_marker` is the end marker of the verb block that is currently
    /// open, if any.
    pub fn next_event(
        &mut self,
        end_marker: Option<&Regex>,
    ) -> Result<Option<LineEvent>, ParseError> {
        loop {
            let Some(physical) = self.next_physical()? else {
                return Ok(None);
            };

            let raw = physical.trim();
            let line_number = self.line_number;

            if raw.is_empty() || raw.starts_with(COMMENT_START) {
                continue;
            }

            if starts_with_keyword(raw, IGNORE_BLOCK_START) {
                if self.skip_ignore_block()? {
                    continue;
                }

                return Ok(None);
            }

            if end_marker.is_some_and(|marker| marker.is_match(raw)) {
                return Ok(Some(LineEvent::BlockEnd {
                    raw: raw.to_string(),
                    line_number,
                }));
            }

            let line = self.join_continued(raw)?;
            if line.is_empty() {
                return Err(ParseError::Entry {
                    line: raw.to_string(),
                    cause: EntryError::EmptyContinuation,
                });
            }

            return Ok(Some(LineEvent::Logical {
                line,
                raw: raw.to_string(),
                line_number,
            }));
        }
    }

    /// Join `first` with the lines that follow it while each ends in a
    /// backslash. Reaching the end of the file ends the line.
    fn join_continued(&mut self, first: &str) -> Result<String, ParseError> {
        let mut full_line = String::new();
        let mut current = first.to_string();

        while let Some(start) = current.strip_suffix(LINE_CONTINUATION) {
            full_line.push_str(start);

            match self.next_physical()? {
                Some(next) => current = next.trim().to_string(),
                None => return Ok(full_line),
            }
        }

        full_line.push_str(&current);
        Ok(full_line)
    }
}
