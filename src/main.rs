use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{Context, Result};
use surveyor_config::{
    config::{ConfigEntry, ConfigReader},
    logging::initialize_tracing,
    modules::BuiltinRegistry,
    settings::Settings,
};
use tracing::info;

use crate::cli::CLIArgs;

mod cli;


const LOG_FILE_NAME_PREFIX: &str = "surveyor-config.log";

/// Source name used for entries given with `--entry`.
const COMMAND_LINE_SOURCE: &str = "<command line>";


fn print_entry(entry: &ConfigEntry) {
    let tags = entry.tags_vec().join(" ");

    println!(
        "{}:{}  {} {} {} [{}] tags: [{}] params: {}",
        entry.source_file.display(),
        entry.line_number,
        entry.verb,
        entry.module_name,
        entry.measure_filter,
        entry.file_filters.join(", "),
        tags,
        entry.params_raw().len()
    );
}


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    // Load settings.
    let settings = match cli_args.settings_file_path.as_ref() {
        Some(path) => {
            println!("Loading settings: {}", path.display());
            Settings::load_from_path(path)
        }
        None => Settings::load_from_default_path_or_defaults(),
    }
    .wrap_err("Failed to load settings file.")?;

    if let Some(file_path) = settings.origin.file_path.as_ref() {
        println!("Settings loaded: {}.", file_path.display());
    }


    let logging_raii_guard = initialize_tracing(&settings.logging, LOG_FILE_NAME_PREFIX)
        .wrap_err("Failed to initialize tracing.")?;

    info!("Tracing initialized.");


    let mut reader = settings.reader.config_reader(BuiltinRegistry::new());
    if let Some(tags) = cli_args.tags.as_ref() {
        reader = reader.with_extra_line_content(tags.join(" "));
    }

    let entries = match cli_args.entry_line.as_ref() {
        Some(entry_line) => reader.read_str(COMMAND_LINE_SOURCE, entry_line)?,
        None => {
            let config_file_path = settings
                .reader
                .locate_config_file(cli_args.config_path.as_deref())
                .wrap_err("Failed to locate config file.")?;

            read_config_file(&reader, &config_file_path)?
        }
    };

    for entry in &entries {
        print_entry(entry);
    }

    info!("{} config entries.", entries.len());


    drop(logging_raii_guard);
    Ok(())
}


fn read_config_file(
    reader: &ConfigReader<BuiltinRegistry>,
    config_file_path: &Path,
) -> Result<Vec<ConfigEntry>> {
    let config_file_path: PathBuf = dunce::simplified(config_file_path).to_path_buf();
    info!("Reading config file: {}", config_file_path.display());

    Ok(reader.read_file(&config_file_path)?)
}
