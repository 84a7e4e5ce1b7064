use std::{
    fs,
    path::{Path, PathBuf},
};

use surveyor_config::{
    config::{ConfigEntry, ConfigError, ConfigReader, EntryError, ParseError},
    modules::{BuiltinRegistry, ModuleError, ModuleOption},
};
use tempfile::TempDir;


fn write(directory: &Path, name: &str, contents: &str) -> PathBuf {
    let path = directory.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    fs::write(&path, contents).unwrap();
    path
}

fn read(path: &Path) -> Result<Vec<ConfigEntry>, ConfigError> {
    ConfigReader::new(BuiltinRegistry::new()).read_file(path)
}

fn file_filters(entries: &[ConfigEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.file_filter.as_str()).collect()
}


#[test]
fn base_file_wins_over_include_and_keeps_its_constants() {
    let directory = TempDir::new().unwrap();
    write(
        directory.path(),
        "common.code",
        "measure NBNC file.* *.py\n\
         measure NBNC file.* PY\n",
    );
    let base = write(
        directory.path(),
        "surveyor.code",
        "CONSTANT:PY:*.py\n\
         measure Code * PY base\n\
         INCLUDE:common.code:\n",
    );

    let entries = read(&base).unwrap();

    // `PY` stays literal in the included file.
    assert_eq!(file_filters(&entries), vec!["*.py", "PY"]);
    assert_eq!(entries[0].module_name, "Code");
    assert_eq!(entries[0].source_file, base);
    assert_eq!(entries[1].source_file, directory.path().join("common.code"));
}

#[test]
fn included_entries_follow_base_entries() {
    let directory = TempDir::new().unwrap();
    write(
        directory.path(),
        "common.code",
        "measure Code * *.java\n\
         measure Code * *.cs\n",
    );
    let base = write(
        directory.path(),
        "surveyor.code",
        "INCLUDE:common.code:\n\
         measure Code * *.py\n",
    );

    // The include is merged where it appears, before later base entries.
    assert_eq!(file_filters(&read(&base).unwrap()), vec!["*.java", "*.cs", "*.py"]);
}

#[test]
fn include_tags_are_added_to_merged_entries() {
    let directory = TempDir::new().unwrap();
    write(
        directory.path(),
        "search.code",
        "search Code search.* *.rs rust\n\
         \x20   TODO\n\
         search_end\n",
    );
    let base = write(
        directory.path(),
        "surveyor.code",
        "INCLUDE:search.code:nightly  OPT:SEARCH_CASE_SENSITIVE\n",
    );

    let entries = read(&base).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].tags_vec(),
        vec!["OPT:SEARCH_CASE_SENSITIVE", "nightly", "rust"]
    );
    assert_eq!(
        entries[0].options,
        vec![ModuleOption::new("SEARCH_CASE_SENSITIVE", None)]
    );
    assert_eq!(entries[0].params_raw(), ["TODO"]);
}

#[test]
fn includes_resolve_relative_to_the_including_file() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "languages/c.code", "measure Code * *.c;*.h\n");
    write(
        directory.path(),
        "languages/all.code",
        "INCLUDE:c.code:\nmeasure Code * *.py\n",
    );
    let base = write(directory.path(), "surveyor.code", "INCLUDE:languages/all.code:\n");

    assert_eq!(file_filters(&read(&base).unwrap()), vec!["*.c;*.h", "*.py"]);
}

#[test]
fn include_cycle_is_reported() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "a.code", "INCLUDE:b.code:\n");
    write(directory.path(), "b.code", "measure Code * *.py\nINCLUDE:surveyor.code:\n");
    let base = write(directory.path(), "surveyor.code", "INCLUDE:a.code:\n");

    let error = read(&base).unwrap_err();

    let ParseError::IncludeCycle { chain } = &error.cause else {
        panic!("expected an include cycle, got {error}");
    };
    assert_eq!(chain.len(), 4);
    assert_eq!(chain.first(), chain.last());
    assert!(chain[1].ends_with("a.code"));
}

#[test]
fn self_include_is_a_cycle() {
    let directory = TempDir::new().unwrap();
    let base = write(directory.path(), "surveyor.code", "INCLUDE:surveyor.code:\n");

    assert!(matches!(
        read(&base).unwrap_err().cause,
        ParseError::IncludeCycle { .. }
    ));
}

#[test]
fn shared_include_from_two_branches_is_not_a_cycle() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "shared.code", "measure Code * *.txt\n");
    write(directory.path(), "a.code", "INCLUDE:shared.code:\n");
    write(directory.path(), "b.code", "INCLUDE:shared.code:\n");
    let base = write(
        directory.path(),
        "surveyor.code",
        "INCLUDE:a.code:\nINCLUDE:b.code:\n",
    );

    // The second copy has the same filter string and is dropped on merge.
    assert_eq!(file_filters(&read(&base).unwrap()), vec!["*.txt"]);
}

#[test]
fn include_depth_is_limited() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "b.code", "measure Code * *.py\n");
    write(directory.path(), "a.code", "INCLUDE:b.code:\n");
    let base = write(directory.path(), "surveyor.code", "INCLUDE:a.code:\n");

    let error = ConfigReader::new(BuiltinRegistry::new())
        .with_max_include_depth(1)
        .read_file(&base)
        .unwrap_err();

    assert!(matches!(
        error.cause,
        ParseError::IncludeTooDeep { ref path, limit: 1 } if path.ends_with("b.code")
    ));

    // One level fewer is fine.
    let entries = ConfigReader::new(BuiltinRegistry::new())
        .with_max_include_depth(2)
        .read_file(&base)
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn missing_include_is_reported_against_the_outer_file() {
    let directory = TempDir::new().unwrap();
    let base = write(directory.path(), "surveyor.code", "INCLUDE:missing.code:\n");

    let error = read(&base).unwrap_err();

    assert_eq!(error.path, base);
    assert!(matches!(
        error.cause,
        ParseError::Io { ref path, .. } if path.ends_with("missing.code")
    ));
}

#[test]
fn errors_in_included_files_name_the_outer_file() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "broken.code", "measure Cobol * *.cbl\n");
    let base = write(directory.path(), "surveyor.code", "INCLUDE:broken.code:\n");

    let error = read(&base).unwrap_err();
    let message = error.to_string();

    assert_eq!(error.path, base);
    assert!(message.contains(&base.display().to_string()));
    assert!(message.contains("Cobol"));
}

#[test]
fn unsupported_include_option_fails_the_read() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "common.code", "measure NBNC * *.c\n");
    let base = write(directory.path(), "surveyor.code", "INCLUDE:common.code:OPT:BOGUS\n");

    assert!(matches!(
        read(&base).unwrap_err().cause,
        ParseError::Entry {
            cause: EntryError::Module(ModuleError::UnknownOption { .. }),
            ..
        }
    ));
}

#[test]
fn disjoint_file_filters_are_never_duplicates() {
    let directory = TempDir::new().unwrap();
    let base = write(
        directory.path(),
        "surveyor.code",
        "measure Code * *.py\nmeasure Code * *.java\n",
    );

    assert_eq!(read(&base).unwrap().len(), 2);
}

#[test]
fn duplicate_across_include_is_reported_with_both_sides() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "common.code", "measure NBNC file.* *.c\n");
    let base = write(
        directory.path(),
        "surveyor.code",
        "measure Code * *.py;*.c\nINCLUDE:common.code:\n",
    );

    let error = read(&base).unwrap_err();
    assert_eq!(error.path, base);

    let ParseError::DupeMeasures(duplicate) = error.cause else {
        panic!("expected duplicate measures");
    };

    assert_eq!(duplicate.verb, "measure");
    assert_eq!(duplicate.first.module_name, "Code");
    assert_eq!(duplicate.first.file_filter, "*.c");
    assert_eq!(duplicate.first.measure_filter, "*");
    assert_eq!(duplicate.second.module_name, "NBNC");
    assert_eq!(duplicate.second.measure_filter, "file.*");
}

#[test]
fn tags_separate_otherwise_duplicate_entries() {
    let directory = TempDir::new().unwrap();
    let base = write(
        directory.path(),
        "surveyor.code",
        "measure Code * *.py production\nmeasure Code * *.py tests\n",
    );

    assert_eq!(read(&base).unwrap().len(), 2);
}

#[test]
fn verb_block_round_trip() {
    let directory = TempDir::new().unwrap();
    let base = write(
        directory.path(),
        "surveyor.code",
        "CONSTANT:MARKER:FIXME\n\
         search Code search.* *.py\n\
         \x20   POSITIVE__ TODO\n\
         \x20   # comments inside the block are skipped\n\
         \x20   MARKER\n\
         \x20   NEGATIVE__ \\bTODO_OK\\b\n\
         SEARCH_END\n\
         measure Code file.* *.py\n",
    );

    let entries = read(&base).unwrap();
    assert_eq!(entries.len(), 2);

    let search = &entries[0];
    assert_eq!(
        search.params_raw(),
        ["POSITIVE__ TODO", "MARKER", "NEGATIVE__ \\bTODO_OK\\b"]
    );

    let processed = search.params_processed();
    assert_eq!(processed.len(), 3);
    assert!(processed[0].positive);
    assert!(processed[1].pattern.is_match("fixme: later"));
    assert!(!processed[2].positive);
    assert!(processed[2].pattern.is_match("x = 1  # todo_ok"));
}

#[test]
fn ignore_block_at_end_of_included_file() {
    let directory = TempDir::new().unwrap();
    write(
        directory.path(),
        "common.code",
        "measure Code * *.rb\n\
         IGNORE_START\n\
         CONSTANT:X:Y\n\
         measure Code * *.js\n",
    );
    let base = write(
        directory.path(),
        "surveyor.code",
        "INCLUDE:common.code:\nmeasure Code * *.go\n",
    );

    assert_eq!(file_filters(&read(&base).unwrap()), vec!["*.rb", "*.go"]);
}

#[test]
fn constants_inside_ignore_block_have_no_effect() {
    let directory = TempDir::new().unwrap();
    let base = write(
        directory.path(),
        "surveyor.code",
        "CONSTANT:PY:*.py\n\
         IGNORE_START\n\
         CONSTANT:PY:*.java\n\
         CONSTANT:RB:*.rb\n\
         IGNORE_STOP\n\
         measure Code * PY\n\
         measure Code * RB\n",
    );

    // The earlier definition of `PY` survives and `RB` is never defined.
    assert_eq!(file_filters(&read(&base).unwrap()), vec!["*.py", "RB"]);
}

#[test]
fn continued_lines_form_one_entry() {
    let directory = TempDir::new().unwrap();
    let base = write(
        directory.path(),
        "surveyor.code",
        "measure \\\n\
         \x20   Code * \\\n\
         \x20   *.py;\\\n\
         \x20   *.pyw python\n",
    );

    let entries = read(&base).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_filters, vec!["*.py", "*.pyw"]);
    assert_eq!(entries[0].tags_vec(), vec!["python"]);
    assert_eq!(entries[0].line_number, 1);
}

#[test]
fn in_memory_config_resolves_includes_next_to_its_source_path() {
    let directory = TempDir::new().unwrap();
    write(directory.path(), "common.code", "measure Code * *.kt\n");

    let entries = ConfigReader::new(BuiltinRegistry::new())
        .read_str(
            directory.path().join("virtual.code"),
            "INCLUDE:common.code:mobile\n",
        )
        .unwrap();

    assert_eq!(entries[0].tags_vec(), vec!["mobile"]);
}

#[test]
fn demo_config_reads_cleanly() {
    let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/surveyor.code");

    let entries = read(&demo).unwrap();

    assert_eq!(
        file_filters(&entries),
        vec![
            "*.py;*.pyw;*.rb",
            "*.c;*.h;*.cpp;*.hpp",
            "*.java",
            "*.kt;*.kts",
            "*.py;*.java",
            "*.java;*.kt",
        ]
    );
    assert_eq!(entries[2].tags_vec(), vec!["jvm"]);
    assert_eq!(entries[4].params_raw().len(), 2);
}
