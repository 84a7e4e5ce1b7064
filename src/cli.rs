//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;



/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "surveyor-config",
    author,
    about = "Reads and checks Code Surveyor config files.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the settings file to use.
    /// If unspecified, this defaults to `./data/settings.toml`
    /// (or built-in defaults if that file doesn't exist).
    #[arg(
        short = 's',
        long = "settings-file-path",
        help = "Path to the settings file to use. Defaults to ./data/settings.toml"
    )]
    pub settings_file_path: Option<PathBuf>,

    #[arg(
        short = 'e',
        long = "entry",
        conflicts_with = "config_path",
        help = "Read a single entry line instead of a config file, \
                e.g. \"measure Code * *.py\"."
    )]
    pub entry_line: Option<String>,

    #[arg(
        long = "tags",
        num_args = 1..,
        help = "Tags to add to every entry. Replaces extra_line_content from the settings."
    )]
    pub tags: Option<Vec<String>>,

    #[arg(
        help = "Config file to read, or a directory containing one. \
                Without one, the current directory and then the search \
                directories from the settings are searched."
    )]
    pub config_path: Option<PathBuf>,
}
