//! Measurement modules, as seen by the config reader.
//!
//! The reader never measures anything itself. For every entry it asks a
//! [`ModuleRegistry`] for the module the entry names and then asks that
//! [`MeasureModule`] whether it can do what the entry requests, whether the
//! entry's verb opens a parameter block and how to parse each parameter line.
//!
//! [`BuiltinRegistry`] provides the standard surveyor modules; anything else
//! implementing [`ModuleRegistry`] can be handed to
//! [`ConfigReader::new`][crate::config::ConfigReader::new] instead.

use std::{fmt, sync::Arc};

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

mod builtin;
mod search;

pub use builtin::{BuiltinRegistry, BUILTIN_MODULE_NAMES};
pub use search::{NEGATIVE_PARAM_PREFIX, POSITIVE_PARAM_PREFIX};


/// Errors raised by modules and module registries.
#[derive(Error, Diagnostic, Debug)]
pub enum ModuleError {
    #[error("could not find surveyor module: {name}")]
    #[diagnostic(code(surveyor::module::unknown))]
    UnknownModule { name: String },

    #[error("module {module} does not support option {option}")]
    #[diagnostic(code(surveyor::module::unknown_option))]
    UnknownOption { module: String, option: String },

    #[error("invalid parameter expression `{param}`: {cause}")]
    #[diagnostic(code(surveyor::module::invalid_param))]
    InvalidParam { param: String, cause: regex::Error },
}


/// A module option attached to an entry with an `OPT:<NAME>[:<value>]` tag.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ModuleOption {
    pub name: String,
    pub value: Option<String>,
}

impl ModuleOption {
    pub fn new<N: Into<String>>(name: N, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for ModuleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}


/// A parameter line after the owning module has parsed it.
#[derive(Clone, Debug)]
pub struct ProcessedParam {
    /// `false` for parameters that exclude matches (`NEGATIVE__` prefix).
    pub positive: bool,

    /// Raw parameter text with runs of whitespace collapsed.
    pub text: String,

    /// Compiled expression the module will search with.
    pub pattern: Regex,
}


/// Capabilities the config reader needs from a measurement module.
pub trait MeasureModule: fmt::Debug + Send + Sync {
    /// Name the module was loaded under.
    fn name(&self) -> &str;

    /// Can the module produce the measures selected by `measure_filter`?
    fn can_do_measure(&self, measure_filter: &str) -> bool;

    /// Does the module understand `verb`?
    fn can_do_verb(&self, verb: &str) -> bool;

    /// If `verb` is followed by a block of parameter lines, returns the
    /// pattern of the line that closes the block.
    fn verb_end_marker(&self, verb: &str) -> Option<Regex>;

    /// Parse one parameter line. `line` has already had constants and
    /// inline comments processed, `raw_line` is the line as written.
    fn add_param(&self, line: &str, raw_line: &str) -> Result<ProcessedParam, ModuleError>;

    /// Would the two measure filters select overlapping measures?
    fn match_measure(&self, first_filter: &str, second_filter: &str) -> bool;
}


/// Source of measurement modules, keyed by module name and options.
pub trait ModuleRegistry {
    fn load(
        &self,
        module_name: &str,
        options: &[ModuleOption],
    ) -> Result<Arc<dyn MeasureModule>, ModuleError>;
}

impl<R: ModuleRegistry + ?Sized> ModuleRegistry for &R {
    fn load(
        &self,
        module_name: &str,
        options: &[ModuleOption],
    ) -> Result<Arc<dyn MeasureModule>, ModuleError> {
        (**self).load(module_name, options)
    }
}

impl<R: ModuleRegistry + ?Sized> ModuleRegistry for Arc<R> {
    fn load(
        &self,
        module_name: &str,
        options: &[ModuleOption],
    ) -> Result<Arc<dyn MeasureModule>, ModuleError> {
        (**self).load(module_name, options)
    }
}
