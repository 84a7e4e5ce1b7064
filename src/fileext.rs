//! File filter matching used when checking config entries for overlap.
//!
//! Config entries select the files they measure with glob-like filters
//! (`*.py`, `src/*.c`) or, when prefixed with [`REGEX_FILTER_MARKER`],
//! with a regular expression.

use globset::GlobBuilder;


/// Prefix marking a file filter as a regular expression rather than a glob.
pub const REGEX_FILTER_MARKER: &str = "re:";


/// Returns `true` if the filter is a regular expression filter.
#[inline]
pub fn is_regex_filter(filter: &str) -> bool {
    filter.starts_with(REGEX_FILTER_MARKER)
}


/// Returns `true` if the two filter patterns could select the same files.
///
/// Two patterns overlap if they are identical, or if either one (as a glob)
/// matches the other one taken as a literal file name. The comparison is
/// case-insensitive.
pub fn file_ext_match(filter_pattern: &str, candidate_pattern: &str) -> bool {
    if filter_pattern.eq_ignore_ascii_case(candidate_pattern) {
        return true;
    }

    glob_matches(filter_pattern, candidate_pattern)
        || glob_matches(candidate_pattern, filter_pattern)
}


/// Match `candidate` against `pattern` compiled as a glob.
///
/// Patterns that don't compile never match anything except themselves,
/// which [`file_ext_match`] has already checked.
pub(crate) fn glob_matches(pattern: &str, candidate: &str) -> bool {
    match GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(false)
        .build()
    {
        Ok(glob) => glob.compile_matcher().is_match(candidate),
        Err(_) => false,
    }
}
