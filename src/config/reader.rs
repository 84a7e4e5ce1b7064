use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use regex::Regex;
use tracing::{debug, info, trace};

use super::{
    constants::Constants,
    entry::{ConfigEntry, EntryLine},
    error::{ConfigError, EntryError, ParseError},
    lines::{starts_with_keyword, LineEvent, LogicalLines},
    validate::validate_entries,
};
use crate::modules::ModuleRegistry;


/// Include chains deeper than this are rejected.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 16;

/// Inline comments start with a space followed by a hash.
const INLINE_COMMENT: &str = " #";

pub const CONSTANT_DIRECTIVE: &str = "CONSTANT";
pub const CONSTANT_NOBLANK_DIRECTIVE: &str = "CONSTANT_NOBLANK";
pub const INCLUDE_DIRECTIVE: &str = "INCLUDE";


/// Reads surveyor config files into validated [`ConfigEntry`] lists.
///
/// The reader is stateless between reads: everything a read accumulates
/// (constants, open verb blocks, the include chain) lives only for the
/// duration of that read.
#[derive(Debug)]
pub struct ConfigReader<R> {
    registry: R,
    extra_line_content: String,
    max_include_depth: usize,
}

impl<R: ModuleRegistry> ConfigReader<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            extra_line_content: String::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Text appended to every entry-definition line, e.g. tags that apply to
    /// a whole measurement job.
    pub fn with_extra_line_content<S: Into<String>>(mut self, extra_line_content: S) -> Self {
        self.extra_line_content = extra_line_content.into();
        self
    }

    pub fn with_max_include_depth(mut self, max_include_depth: usize) -> Self {
        self.max_include_depth = max_include_depth;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Read a config file, including any files it includes, and check the
    /// result for double counting.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ConfigEntry>, ConfigError> {
        let path = path.as_ref();
        info!("Config file: {}", path.display());

        let entries = self
            .read_and_validate(path, |include_stack| self.parse_file(path, include_stack))
            .map_err(|cause| ConfigError::new(path, cause))?;

        debug!("Finished reading config file: {}", path.display());
        Ok(entries)
    }

    /// Read config text held in memory as if it had been read from
    /// `source_path`. Relative includes are resolved against the directory
    /// of `source_path`.
    pub fn read_str<P: AsRef<Path>>(
        &self,
        source_path: P,
        text: &str,
    ) -> Result<Vec<ConfigEntry>, ConfigError> {
        let source_path = source_path.as_ref();
        let lines = text.lines().map(|line| Ok(line.to_string()));

        self.read_and_validate(source_path, |include_stack| {
            self.parse_lines(source_path, lines, include_stack)
        })
        .map_err(|cause| ConfigError::new(source_path, cause))
    }

    fn read_and_validate<F>(&self, path: &Path, parse: F) -> Result<Vec<ConfigEntry>, ParseError>
    where
        F: FnOnce(&mut Vec<PathBuf>) -> Result<Vec<ConfigEntry>, ParseError>,
    {
        let mut include_stack = vec![canonical_path(path)];
        let entries = parse(&mut include_stack)?;

        if entries.is_empty() {
            debug!("Config file has no entries");
        } else {
            validate_entries(&entries)?;
        }

        Ok(entries)
    }

    fn parse_file(
        &self,
        path: &Path,
        include_stack: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigEntry>, ParseError> {
        let file = File::open(path).map_err(|error| ParseError::io(path, error))?;
        self.parse_lines(path, BufReader::new(file).lines(), include_stack)
    }

    /// Parse one file's lines. Each call owns its own constants table and
    /// verb block state, so nothing leaks between a file and its includes.
    fn parse_lines<I>(
        &self,
        path: &Path,
        lines: I,
        include_stack: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigEntry>, ParseError>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        let mut lines = LogicalLines::new(path, lines);
        let mut constants = Constants::new();
        let mut entries: Vec<ConfigEntry> = Vec::new();

        // Entry whose verb block is still collecting parameter lines.
        let mut pending: Option<(ConfigEntry, Regex)> = None;

        loop {
            let end_marker = pending.as_ref().map(|(_, marker)| marker);

            let (line, raw, line_number) = match lines.next_event(end_marker)? {
                None => break,
                Some(LineEvent::BlockEnd { raw, line_number }) => {
                    debug!(line_number, "Verb block end: {}", raw);
                    if let Some((entry, _)) = pending.take() {
                        entries.push(entry);
                    }
                    continue;
                }
                Some(LineEvent::Logical {
                    line,
                    raw,
                    line_number,
                }) => (line, raw, line_number),
            };

            if let Some((name, value)) = parse_directive(&line, CONSTANT_DIRECTIVE) {
                debug!("Constant: {} = {}", name, value);
                constants.define(name, value);
                continue;
            }

            if let Some((name, value)) = parse_directive(&line, CONSTANT_NOBLANK_DIRECTIVE) {
                debug!("Noblank constant: {} = {}", name, value);
                constants.define_noblank(name, value);
                continue;
            }

            let line = if constants.is_empty() {
                line
            } else {
                constants.substitute(&line)?
            };
            let line = strip_inline_comment(&line);
            trace!("Full line: {}", line);

            if let Some((include_path, tags)) = parse_directive(line, INCLUDE_DIRECTIVE) {
                let included = self.read_include(path, include_path, include_stack)?;
                merge_included(&mut entries, included, tags, &self.registry)?;
                continue;
            }

            if let Some((entry, _)) = pending.as_mut() {
                let processed = entry.module.add_param(line, &raw).map_err(|cause| {
                    ParseError::Param {
                        entry: entry.to_string(),
                        line: raw.clone(),
                        cause,
                    }
                })?;

                debug!("Loaded param: {} => {:?}", entry.module_name, processed.text);
                entry.push_param(raw, processed);
                continue;
            }

            let entry = self.build_entry(line, &raw, path, line_number)?;
            match entry.module.verb_end_marker(&entry.verb) {
                Some(marker) => pending = Some((entry, marker)),
                None => entries.push(entry),
            }
        }

        // A verb block left open at the end of the file still counts.
        if let Some((entry, _)) = pending {
            debug!("Verb block for `{}` closed by end of file", entry);
            entries.push(entry);
        }

        debug!(
            "Read {} entr{} from {} ({} lines, {} constants)",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            path.display(),
            lines.line_number(),
            constants.len()
        );

        Ok(entries)
    }

    /// Build an entry from an entry-definition line, load its module and
    /// make sure the module can do what the entry asks of it.
    fn build_entry(
        &self,
        line: &str,
        raw: &str,
        path: &Path,
        line_number: usize,
    ) -> Result<ConfigEntry, ParseError> {
        let entry_error = |cause: EntryError| ParseError::Entry {
            line: raw.to_string(),
            cause,
        };

        let entry_line = EntryLine::parse(line, &self.extra_line_content).map_err(entry_error)?;
        let module_name = entry_line.module_name.clone();

        // Options come from the tags, so the entry is assembled against a
        // module loaded without them and reloaded once they are known.
        let module = self
            .registry
            .load(&module_name, &[])
            .map_err(|cause| entry_error(cause.into()))?;
        let mut entry =
            ConfigEntry::new(entry_line, module, path, line_number).map_err(entry_error)?;

        if !entry.options.is_empty() {
            entry.module = self
                .registry
                .load(&module_name, &entry.options)
                .map_err(|cause| entry_error(cause.into()))?;
        }

        validate_line(&entry)?;
        debug!("Entry: {}", entry);

        Ok(entry)
    }

    fn read_include(
        &self,
        including_file: &Path,
        include_path: &str,
        include_stack: &mut Vec<PathBuf>,
    ) -> Result<Vec<ConfigEntry>, ParseError> {
        let include_path = resolve_include_path(including_file, include_path);
        info!("Include: {}", include_path.display());

        let canonical = canonical_path(&include_path);
        if include_stack.contains(&canonical) {
            let mut chain = include_stack.clone();
            chain.push(canonical);
            return Err(ParseError::IncludeCycle { chain });
        }

        if include_stack.len() > self.max_include_depth {
            return Err(ParseError::IncludeTooDeep {
                path: include_path,
                limit: self.max_include_depth,
            });
        }

        include_stack.push(canonical);
        let included = self.parse_file(&include_path, include_stack);
        include_stack.pop();

        included
    }
}


/// Is the module being asked to do something it can do?
fn validate_line(entry: &ConfigEntry) -> Result<(), ParseError> {
    let measure_ok = entry.module.can_do_measure(&entry.measure_filter);
    let verb_ok = entry.module.can_do_verb(&entry.verb);

    if !(measure_ok && verb_ok) {
        debug!(measure_ok, verb_ok, "Module validation failed");
        return Err(ParseError::InvalidMeasure {
            verb: entry.verb.clone(),
            measure_filter: entry.measure_filter.clone(),
        });
    }

    Ok(())
}


/// Add entries from an included file. Entries whose file filter string is
/// already used by an entry of the including file are dropped; the rest get
/// the include's tags and have their module reloaded for any new options.
fn merge_included<R: ModuleRegistry>(
    entries: &mut Vec<ConfigEntry>,
    included: Vec<ConfigEntry>,
    tags: &str,
    registry: &R,
) -> Result<(), ParseError> {
    let existing_filters: Vec<String> = entries
        .iter()
        .map(|entry| entry.file_filter.clone())
        .collect();
    let tags: Vec<&str> = tags.split_whitespace().collect();

    for mut entry in included {
        if existing_filters.contains(&entry.file_filter) {
            debug!("Included entry overridden: {}", entry);
            continue;
        }

        if !tags.is_empty() {
            let entry_error = |cause: EntryError, entry: &ConfigEntry| ParseError::Entry {
                line: entry.to_string(),
                cause,
            };

            entry
                .add_tags(tags.iter().copied())
                .map_err(|cause| entry_error(cause, &entry))?;
            entry.module = registry
                .load(&entry.module_name, &entry.options)
                .map_err(|cause| entry_error(cause.into(), &entry))?;
        }

        entries.push(entry);
    }

    Ok(())
}


/// Split `<KEYWORD>:<name>:<value>` into name and value. The name runs to
/// the first colon and can't be empty or contain whitespace.
fn parse_directive<'l>(line: &'l str, keyword: &str) -> Option<(&'l str, &'l str)> {
    let line = line.trim_start();
    if !starts_with_keyword(line, keyword) {
        return None;
    }

    let (name, value) = line[keyword.len()..].strip_prefix(':')?.split_once(':')?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }

    Some((name, value))
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find(INLINE_COMMENT) {
        Some(position) => &line[..position],
        None => line,
    }
}

fn resolve_include_path(including_file: &Path, include_path: &str) -> PathBuf {
    let include_path = PathBuf::from(include_path);
    if include_path.is_absolute() {
        return include_path;
    }

    match including_file.parent() {
        Some(directory) => directory.join(include_path),
        None => include_path,
    }
}

/// Canonical form of a path for cycle detection. Paths that can't be
/// canonicalized (missing files, in-memory sources) are compared as given.
fn canonical_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
