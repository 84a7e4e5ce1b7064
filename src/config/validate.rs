//! Cross-entry consistency checks.
//!
//! A config file must not make the measurement engine count the same code
//! twice. Entries that share a verb and have overlapping file filters are
//! suspicious; if they also carry identical tags and their module considers
//! the measure filters equivalent, the file is rejected.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::{
    entry::ConfigEntry,
    error::{DuplicateMeasure, MeasureSide, ParseError},
};
use crate::fileext::{file_ext_match, is_regex_filter};


/// Two entries that share a verb and overlapping file filters, but are kept
/// apart by their tags or measure filters.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OverlapWarning {
    pub verb: String,
    pub first_module: String,
    pub first_file_filter: String,
    pub second_module: String,
    pub second_file_filter: String,
}


/// One (entry, file filter) combination.
struct PossibleMeasure<'e> {
    file_filter: &'e str,
    entry: &'e ConfigEntry,
}

impl<'e> PossibleMeasure<'e> {
    fn side(&self) -> MeasureSide {
        MeasureSide {
            module_name: self.entry.module_name.clone(),
            measure_filter: self.entry.measure_filter.clone(),
            file_filter: self.file_filter.to_string(),
            tags: self.entry.tags_vec(),
            params: self.entry.params_raw().to_vec(),
        }
    }
}


/// Check a complete entry list for double counting.
///
/// Returns the pairs that overlap without being duplicates, or
/// [`ParseError::DupeMeasures`] for the first real duplicate found.
/// Combinations are examined from the last one back, each against those
/// defined before it, so the reported pair only depends on entry order.
pub fn validate_entries(entries: &[ConfigEntry]) -> Result<Vec<OverlapWarning>, ParseError> {
    debug!("Checking {} config entries for duplicate measures", entries.len());

    let possible_measures: Vec<PossibleMeasure> = entries
        .iter()
        .flat_map(|entry| {
            entry
                .file_filters
                .iter()
                .map(move |file_filter| PossibleMeasure {
                    file_filter,
                    entry,
                })
        })
        .collect();

    let mut seen_filters = HashSet::with_capacity(possible_measures.len());
    let has_repeated_filter = possible_measures
        .iter()
        .any(|measure| !seen_filters.insert(measure.file_filter));

    if !has_repeated_filter {
        return Ok(Vec::new());
    }

    let mut warnings = Vec::new();

    for (index, current) in possible_measures.iter().enumerate().rev() {
        // Overlap between regular expressions can't be worked out in general.
        if is_regex_filter(current.file_filter) {
            continue;
        }

        let overlapping: Vec<&PossibleMeasure> = possible_measures[..index]
            .iter()
            .filter(|other| {
                other.entry.verb.eq_ignore_ascii_case(&current.entry.verb)
                    && file_ext_match(other.file_filter, current.file_filter)
            })
            .collect();

        if overlapping.is_empty() {
            continue;
        }

        let duplicate = overlapping.iter().find(|other| {
            other.entry.tags == current.entry.tags
                && current
                    .entry
                    .module
                    .match_measure(&other.entry.measure_filter, &current.entry.measure_filter)
        });

        if let Some(other) = duplicate {
            warn!(
                judged_by = current.entry.module.name(),
                "Double-count: {} {} {} and {} {} {}",
                other.entry.verb,
                other.entry.module_name,
                other.file_filter,
                current.entry.verb,
                current.entry.module_name,
                current.file_filter
            );

            return Err(ParseError::DupeMeasures(Box::new(DuplicateMeasure {
                verb: current.entry.verb.clone(),
                first: other.side(),
                second: current.side(),
            })));
        }

        for other in overlapping {
            warn!(
                "Possible double-count: {} {} {} and {} {}",
                current.entry.verb,
                other.entry.module_name,
                other.file_filter,
                current.entry.module_name,
                current.file_filter
            );

            warnings.push(OverlapWarning {
                verb: current.entry.verb.clone(),
                first_module: other.entry.module_name.clone(),
                first_file_filter: other.file_filter.to_string(),
                second_module: current.entry.module_name.clone(),
                second_file_filter: current.file_filter.to_string(),
            });
        }
    }

    Ok(warnings)
}
