use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::{search::parse_search_param, MeasureModule, ModuleError, ModuleOption, ProcessedParam};
use crate::fileext::glob_matches;


const OPTION_SEARCH_CASE_SENSITIVE: &str = "SEARCH_CASE_SENSITIVE";


/// Static description of one of the standard modules.
#[derive(Debug)]
struct ModuleDefinition {
    name: &'static str,

    /// Supported verbs, each with the keyword that closes its parameter
    /// block if it takes one.
    verbs: &'static [(&'static str, Option<&'static str>)],

    /// Measure families the module produces.
    measures: &'static [&'static str],

    /// Option names accepted through `OPT:` tags.
    options: &'static [&'static str],
}

const CODE: ModuleDefinition = ModuleDefinition {
    name: "Code",
    verbs: &[
        ("measure", None),
        ("analyze", None),
        ("search", Some("search_end")),
        ("routines", Some("routines_end")),
        ("tempmeasure", Some("tempmeasure_end")),
    ],
    measures: &["file.*", "nbnc.*", "search.*", "routine.*"],
    options: &[OPTION_SEARCH_CASE_SENSITIVE],
};

const NBNC: ModuleDefinition = ModuleDefinition {
    name: "NBNC",
    verbs: &[("measure", None)],
    measures: &["file.*", "nbnc.*"],
    options: &[],
};

const DUPE_LINES: ModuleDefinition = ModuleDefinition {
    name: "DupeLines",
    verbs: &[("analyze", None)],
    measures: &["file.*", "nbnc.*"],
    options: &[],
};

const DEPENDS: ModuleDefinition = ModuleDefinition {
    name: "Depends",
    verbs: &[("analyze", None)],
    measures: &["file.*", "nbnc.*"],
    options: &[],
};

const SEARCH: ModuleDefinition = ModuleDefinition {
    name: "Search",
    verbs: &[("search", Some("search_end"))],
    measures: &["search.*"],
    options: &[OPTION_SEARCH_CASE_SENSITIVE],
};

const DEFINITIONS: &[&ModuleDefinition] = &[&CODE, &NBNC, &DUPE_LINES, &DEPENDS, &SEARCH];

/// Names of the modules [`BuiltinRegistry`] can load.
pub const BUILTIN_MODULE_NAMES: &[&str] = &["Code", "NBNC", "DupeLines", "Depends", "Search"];



/// One of the standard modules, instantiated with a particular set of options.
#[derive(Debug)]
struct BuiltinModule {
    definition: &'static ModuleDefinition,
    end_markers: HashMap<&'static str, Regex>,
    case_sensitive_search: bool,
}

impl BuiltinModule {
    fn new(
        definition: &'static ModuleDefinition,
        options: &[ModuleOption],
    ) -> Result<Self, ModuleError> {
        let mut case_sensitive_search = false;

        for option in options {
            let supported = definition
                .options
                .iter()
                .find(|name| name.eq_ignore_ascii_case(&option.name));

            match supported {
                Some(&OPTION_SEARCH_CASE_SENSITIVE) => case_sensitive_search = true,
                _ => {
                    return Err(ModuleError::UnknownOption {
                        module: definition.name.to_string(),
                        option: option.to_string(),
                    })
                }
            }
        }

        let mut end_markers = HashMap::new();
        for (verb, end) in definition.verbs {
            if let Some(end) = end {
                let marker = RegexBuilder::new(&format!(r"^\s*{}\b", regex::escape(end)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|cause| ModuleError::InvalidParam {
                        param: end.to_string(),
                        cause,
                    })?;

                end_markers.insert(*verb, marker);
            }
        }

        Ok(Self {
            definition,
            end_markers,
            case_sensitive_search,
        })
    }

    fn find_verb(&self, verb: &str) -> Option<&'static str> {
        self.definition
            .verbs
            .iter()
            .map(|(name, _)| *name)
            .find(|name| name.eq_ignore_ascii_case(verb))
    }
}

impl MeasureModule for BuiltinModule {
    fn name(&self) -> &str {
        self.definition.name
    }

    fn can_do_measure(&self, measure_filter: &str) -> bool {
        let mut requested = measure_filter
            .split(';')
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
            .peekable();

        if requested.peek().is_none() {
            return false;
        }

        requested.all(|filter| {
            self.definition
                .measures
                .iter()
                .any(|measure| measure_patterns_overlap(measure, filter))
        })
    }

    fn can_do_verb(&self, verb: &str) -> bool {
        self.find_verb(verb).is_some()
    }

    fn verb_end_marker(&self, verb: &str) -> Option<Regex> {
        let verb = self.find_verb(verb)?;
        self.end_markers.get(verb).cloned()
    }

    fn add_param(&self, line: &str, raw_line: &str) -> Result<ProcessedParam, ModuleError> {
        parse_search_param(line, raw_line, self.case_sensitive_search)
    }

    fn match_measure(&self, first_filter: &str, second_filter: &str) -> bool {
        first_filter.split(';').map(str::trim).any(|first| {
            second_filter
                .split(';')
                .map(str::trim)
                .any(|second| measure_patterns_overlap(first, second))
        })
    }
}


fn measure_patterns_overlap(first: &str, second: &str) -> bool {
    first.eq_ignore_ascii_case(second)
        || glob_matches(first, second)
        || glob_matches(second, first)
}



/// Registry of the standard surveyor modules.
///
/// Modules are created lazily on first use and cached. Because options change
/// how a module behaves, the cache key is the module name together with its
/// options, so the same module loaded with different `OPT:` tags yields
/// separate instances.
#[derive(Default, Debug)]
pub struct BuiltinRegistry {
    loaded: Mutex<HashMap<String, Arc<BuiltinModule>>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(definition: &ModuleDefinition, options: &[ModuleOption]) -> String {
        let mut key = definition.name.to_string();
        for option in options {
            key.push('|');
            key.push_str(&option.name.to_ascii_uppercase());
            if let Some(value) = &option.value {
                key.push('=');
                key.push_str(value);
            }
        }

        key
    }
}

impl super::ModuleRegistry for BuiltinRegistry {
    fn load(
        &self,
        module_name: &str,
        options: &[ModuleOption],
    ) -> Result<Arc<dyn MeasureModule>, ModuleError> {
        let definition = DEFINITIONS
            .iter()
            .copied()
            .find(|definition| definition.name.eq_ignore_ascii_case(module_name))
            .ok_or_else(|| ModuleError::UnknownModule {
                name: module_name.to_string(),
            })?;

        let key = Self::cache_key(definition, options);

        let mut loaded = self.loaded.lock();
        if let Some(module) = loaded.get(&key) {
            return Ok(module.clone());
        }

        debug!("Loading module: {}", key);
        let module = Arc::new(BuiltinModule::new(definition, options)?);
        loaded.insert(key, module.clone());

        Ok(module)
    }
}
