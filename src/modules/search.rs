use regex::RegexBuilder;
use tracing::debug;

use super::{ModuleError, ProcessedParam};


/// Prefix of a parameter line that must match for a hit to count.
pub const POSITIVE_PARAM_PREFIX: &str = "POSITIVE__";

/// Prefix of a parameter line that suppresses a hit when it matches.
pub const NEGATIVE_PARAM_PREFIX: &str = "NEGATIVE__";


/// Parse a search expression parameter line.
///
/// Expressions are compiled in verbose mode (unescaped whitespace is not
/// significant) and are case-insensitive unless `case_sensitive` is set.
pub(super) fn parse_search_param(
    line: &str,
    raw_line: &str,
    case_sensitive: bool,
) -> Result<ProcessedParam, ModuleError> {
    let mut expression = line.trim();
    let mut positive = true;

    if let Some(rest) = expression.strip_prefix(NEGATIVE_PARAM_PREFIX) {
        positive = false;
        expression = rest;
    } else if let Some(rest) = expression.strip_prefix(POSITIVE_PARAM_PREFIX) {
        expression = rest;
    }

    let pattern = RegexBuilder::new(expression)
        .case_insensitive(!case_sensitive)
        .ignore_whitespace(true)
        .build()
        .map_err(|cause| ModuleError::InvalidParam {
            param: expression.to_string(),
            cause,
        })?;

    debug!(
        positive,
        case_sensitive, "Adding search expression: {}", expression
    );

    Ok(ProcessedParam {
        positive,
        text: raw_line.split_whitespace().collect::<Vec<_>>().join(" "),
        pattern,
    })
}
