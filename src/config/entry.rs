use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use super::{error::EntryError, lines::starts_with_keyword};
use crate::modules::{MeasureModule, ModuleOption, ProcessedParam};


/// Separates multiple file filters inside the file filter field.
pub const FILE_FILTER_SEPARATOR: char = ';';

/// Tags starting with this prefix set module options.
pub const OPTION_TAG_PREFIX: &str = "OPT:";


/// The fields of an entry-definition line, before its module is loaded.
///
/// ```text
/// <verb> <module> <measureFilter> <fileFilters> [tag ...]
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EntryLine {
    pub verb: String,
    pub module_name: String,
    pub measure_filter: String,
    pub file_filter: String,
    pub tags: Vec<String>,
}

impl EntryLine {
    /// Split an entry-definition line into its fields. `extra_line_content`
    /// is appended to the line first.
    pub fn parse(line: &str, extra_line_content: &str) -> Result<Self, EntryError> {
        let mut fields = line
            .split_whitespace()
            .chain(extra_line_content.split_whitespace());

        let (Some(verb), Some(module_name), Some(measure_filter), Some(file_filter)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(EntryError::MissingFields {
                found: line.split_whitespace().count(),
            });
        };

        Ok(Self {
            verb: verb.to_string(),
            module_name: module_name.to_string(),
            measure_filter: measure_filter.to_string(),
            file_filter: file_filter.to_string(),
            tags: fields.map(str::to_string).collect(),
        })
    }
}


/// Parse an `OPT:<NAME>[:<value>]` tag. Returns `None` for ordinary tags.
pub fn parse_option_tag(tag: &str) -> Option<Result<ModuleOption, EntryError>> {
    if !starts_with_keyword(tag, OPTION_TAG_PREFIX) {
        return None;
    }

    let option = &tag[OPTION_TAG_PREFIX.len()..];
    let (name, value) = match option.split_once(':') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (option, None),
    };

    if name.is_empty() {
        return Some(Err(EntryError::MalformedOption {
            tag: tag.to_string(),
        }));
    }

    Some(Ok(ModuleOption::new(name, value)))
}


/// One measurement directive read from a config file.
#[derive(Clone, Debug)]
pub struct ConfigEntry {
    pub verb: String,

    pub module_name: String,

    /// Module that will perform the measurement, shared with the registry.
    pub module: Arc<dyn MeasureModule>,

    pub measure_filter: String,

    /// File filter field as written; include merging compares this string.
    pub file_filter: String,

    /// The individual filters of [`Self::file_filter`], in order, without
    /// duplicates.
    pub file_filters: Vec<String>,

    pub tags: BTreeSet<String>,

    /// Module options taken from `OPT:` tags, in the order they appeared.
    pub options: Vec<ModuleOption>,

    /// Config file the entry was defined in.
    pub source_file: PathBuf,

    pub line_number: usize,

    params_raw: Vec<String>,
    params_processed: Vec<ProcessedParam>,
}

impl ConfigEntry {
    pub fn new<P: AsRef<Path>>(
        line: EntryLine,
        module: Arc<dyn MeasureModule>,
        source_file: P,
        line_number: usize,
    ) -> Result<Self, EntryError> {
        let mut file_filters: Vec<String> = Vec::new();
        for filter in line
            .file_filter
            .split(FILE_FILTER_SEPARATOR)
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
        {
            if !file_filters.iter().any(|existing| existing == filter) {
                file_filters.push(filter.to_string());
            }
        }

        let mut entry = Self {
            verb: line.verb,
            module_name: line.module_name,
            module,
            measure_filter: line.measure_filter,
            file_filter: line.file_filter,
            file_filters,
            tags: BTreeSet::new(),
            options: Vec::new(),
            source_file: source_file.as_ref().to_path_buf(),
            line_number,
            params_raw: Vec::new(),
            params_processed: Vec::new(),
        };

        entry.add_tags(line.tags)?;
        Ok(entry)
    }

    /// Add tags to the entry. `OPT:` tags also become module options; the
    /// caller is responsible for reloading the module afterwards.
    pub fn add_tags<I, S>(&mut self, tags: I) -> Result<(), EntryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag: String = tag.into();

            if let Some(option) = parse_option_tag(&tag) {
                let option = option?;
                if !self.options.contains(&option) {
                    self.options.push(option);
                }
            }

            self.tags.insert(tag);
        }

        Ok(())
    }

    /// Record a parameter line in both its raw and processed forms.
    pub fn push_param<S: Into<String>>(&mut self, raw: S, processed: ProcessedParam) {
        self.params_raw.push(raw.into());
        self.params_processed.push(processed);
    }

    /// Parameter lines exactly as they appeared in the config file.
    pub fn params_raw(&self) -> &[String] {
        &self.params_raw
    }

    /// Parameter lines as parsed by the module, parallel to
    /// [`Self::params_raw`].
    pub fn params_processed(&self) -> &[ProcessedParam] {
        &self.params_processed
    }

    pub fn tags_vec(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }
}

impl fmt::Display for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.verb, self.module_name, self.measure_filter, self.file_filter
        )?;

        for tag in &self.tags {
            write!(f, " {}", tag)?;
        }

        Ok(())
    }
}
