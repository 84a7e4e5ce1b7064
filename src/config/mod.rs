//! Reading surveyor config files.
//!
//! Your starting point should probably be [`ConfigReader::read_file`].
//!
//! # Format
//! A config file is read line by line:
//!
//! ```text
//! # comment
//! CONSTANT:PY_FILES:*.py;*.pyw
//! CONSTANT_NOBLANK:C_FILES: *.c ; *.h
//! INCLUDE:common.code:nightly
//!
//! measure Code * PY_FILES python   # inline comment
//! measure NBNC file.* \
//!     C_FILES
//!
//! search Code search.* *.py
//!     TODO
//!     NEGATIVE__ TODO_OK
//! search_end
//!
//! IGNORE_START
//! measure Code * *.js
//! IGNORE_STOP
//! ```
//!
//! # Internals
//! [`LogicalLines`] turns physical lines into logical ones (comments,
//! ignore blocks and continuations are handled there), [`Constants`] expands
//! constants, the reader dispatches directives, entry lines and parameter
//! lines, and once the whole file has been read [`validate_entries`] makes
//! sure nothing would be measured twice.

mod constants;
mod entry;
mod error;
mod lines;
mod reader;
mod validate;

pub use constants::{Constants, MAX_CONSTANT_REPLACE};
pub use entry::{
    parse_option_tag,
    ConfigEntry,
    EntryLine,
    FILE_FILTER_SEPARATOR,
    OPTION_TAG_PREFIX,
};
pub use error::{ConfigError, DuplicateMeasure, EntryError, MeasureSide, ParseError};
pub use lines::{
    LineEvent,
    LogicalLines,
    COMMENT_START,
    IGNORE_BLOCK_START,
    IGNORE_BLOCK_STOP,
    LINE_CONTINUATION,
};
pub use reader::{
    ConfigReader,
    CONSTANT_DIRECTIVE,
    CONSTANT_NOBLANK_DIRECTIVE,
    DEFAULT_MAX_INCLUDE_DEPTH,
    INCLUDE_DIRECTIVE,
};
pub use validate::{validate_entries, OverlapWarning};
