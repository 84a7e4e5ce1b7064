use std::{
    fmt,
    path::{Path, PathBuf},
};

use miette::Diagnostic;
use thiserror::Error;

use crate::modules::ModuleError;


/// Failure reading a config file.
///
/// Whatever goes wrong anywhere in a read (including inside included files)
/// is reported against the file the caller asked for, with the innermost
/// problem as the cause.
#[derive(Error, Diagnostic, Debug)]
#[error("error processing configuration file {}: {cause}", .path.display())]
#[diagnostic(code(surveyor::config))]
pub struct ConfigError {
    pub path: PathBuf,
    pub cause: ParseError,
}

impl ConfigError {
    pub(crate) fn new<P: Into<PathBuf>>(path: P, cause: ParseError) -> Self {
        Self {
            path: path.into(),
            cause,
        }
    }
}


/// Problems found while parsing and validating config text.
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("error processing config entry `{line}`: {cause}")]
    #[diagnostic(code(surveyor::config::entry))]
    Entry { line: String, cause: EntryError },

    #[error("error processing parameter `{line}` of config entry `{entry}`: {cause}")]
    #[diagnostic(code(surveyor::config::param))]
    Param {
        entry: String,
        line: String,
        cause: ModuleError,
    },

    #[error("config requested a measure the module cannot perform: {verb}, {measure_filter}")]
    #[diagnostic(code(surveyor::config::invalid_measure))]
    InvalidMeasure {
        verb: String,
        measure_filter: String,
    },

    #[error("constant substitution depth of {limit} exceeded: {line}")]
    #[diagnostic(code(surveyor::config::constants_too_deep))]
    ConstantsTooDeep { limit: usize, line: String },

    #[error("duplicate measures:\n{0}")]
    #[diagnostic(
        code(surveyor::config::dupe_measures),
        help("entries with the same verb, overlapping file filters and identical tags would count the same code twice")
    )]
    DupeMeasures(Box<DuplicateMeasure>),

    #[error("include cycle: {}", format_chain(.chain))]
    #[diagnostic(code(surveyor::config::include_cycle))]
    IncludeCycle { chain: Vec<PathBuf> },

    #[error("includes nested deeper than {limit} levels at {}", .path.display())]
    #[diagnostic(code(surveyor::config::include_depth))]
    IncludeTooDeep { path: PathBuf, limit: usize },

    #[error("could not read {}: {cause}", .path.display())]
    #[diagnostic(code(surveyor::config::io))]
    Io {
        path: PathBuf,
        cause: std::io::Error,
    },
}

impl ParseError {
    pub(crate) fn io<P: AsRef<Path>>(path: P, cause: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            cause,
        }
    }
}


/// Reasons an entry-definition line could not be turned into an entry.
#[derive(Error, Diagnostic, Debug)]
pub enum EntryError {
    #[error("expected `<verb> <module> <measures> <files> [tags]`, found {found} field(s)")]
    #[diagnostic(code(surveyor::config::entry::fields))]
    MissingFields { found: usize },

    #[error("continued line is empty")]
    #[diagnostic(code(surveyor::config::entry::empty))]
    EmptyContinuation,

    #[error("malformed option tag `{tag}`")]
    #[diagnostic(code(surveyor::config::entry::option))]
    MalformedOption { tag: String },

    #[error("{0}")]
    #[diagnostic(transparent)]
    Module(#[from] ModuleError),
}


/// One side of a double-counting conflict.
#[derive(Clone, Debug)]
pub struct MeasureSide {
    pub module_name: String,
    pub measure_filter: String,
    pub file_filter: String,
    pub tags: Vec<String>,
    pub params: Vec<String>,
}

/// Two entries that would measure the same code under the same verb.
#[derive(Clone, Debug)]
pub struct DuplicateMeasure {
    pub verb: String,
    pub first: MeasureSide,
    pub second: MeasureSide,
}

impl fmt::Display for DuplicateMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for side in [&self.first, &self.second] {
            writeln!(
                f,
                "    {} {} {} {} [{}] {:?}",
                self.verb,
                side.module_name,
                side.measure_filter,
                side.file_filter,
                side.tags.join(" "),
                side.params
            )?;
        }

        Ok(())
    }
}


fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
