use std::{
    env::current_dir,
    path::{Path, PathBuf},
};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::{ConfigReader, DEFAULT_MAX_INCLUDE_DEPTH},
    modules::ModuleRegistry,
    settings::{origin::SettingsOrigin, traits::ResolvableSettings},
};


const DEFAULT_CONFIG_FILE_NAME: &str = "surveyor.code";


#[derive(Deserialize, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub(super) struct UnresolvedReaderSettings {
    config_file_name: String,

    search_directories: Vec<String>,

    max_include_depth: usize,

    extra_line_content: String,
}

impl Default for UnresolvedReaderSettings {
    fn default() -> Self {
        Self {
            config_file_name: DEFAULT_CONFIG_FILE_NAME.to_string(),
            search_directories: Vec::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            extra_line_content: String::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReaderSettings {
    /// Config file looked for when a directory is given instead of a file.
    pub config_file_name: String,

    /// Where to look for the config file, after the starting directory,
    /// when no path is given at all.
    pub search_directories: Vec<PathBuf>,

    pub max_include_depth: usize,

    /// Appended to every entry-definition line.
    pub extra_line_content: String,
}

impl ResolvableSettings for UnresolvedReaderSettings {
    type Resolved = ReaderSettings;

    fn resolve(self, origin: &SettingsOrigin) -> Result<Self::Resolved> {
        let config_file_name = self.config_file_name.trim().to_string();

        let is_plain_file_name = Path::new(&config_file_name)
            .file_name()
            .is_some_and(|name| name == config_file_name.as_str());

        if !is_plain_file_name {
            return Err(miette!(
                "Field config_file_name must be a plain file name, got \"{}\".",
                self.config_file_name
            ));
        }

        let search_directories = self
            .search_directories
            .iter()
            .map(|directory| origin.resolve_path(directory.trim()))
            .collect();

        Ok(ReaderSettings {
            config_file_name,
            search_directories,
            max_include_depth: self.max_include_depth,
            extra_line_content: self.extra_line_content,
        })
    }
}

impl ReaderSettings {
    /// The config file to read for a path given by the user: the path itself,
    /// or the config file inside it if it is a directory. Without a path, the
    /// current directory and then the search directories are tried.
    pub fn locate_config_file(&self, path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) if path.is_dir() => Ok(path.join(&self.config_file_name)),
            Some(path) => Ok(path.to_path_buf()),
            None => {
                let current_directory = current_dir()
                    .into_diagnostic()
                    .wrap_err("Could not get the current directory.")?;

                self.find_config_file(&current_directory)
            }
        }
    }

    /// First `config_file_name` found in `start_directory` or one of the
    /// search directories.
    pub fn find_config_file(&self, start_directory: &Path) -> Result<PathBuf> {
        let candidates = std::iter::once(start_directory)
            .chain(self.search_directories.iter().map(PathBuf::as_path))
            .map(|directory| directory.join(&self.config_file_name));

        for candidate in candidates {
            if candidate.is_file() {
                return Ok(candidate);
            }

            debug!("No config file at {}", candidate.display());
        }

        Err(miette!(
            "Could not find {} in {} or any of the {} search directories.",
            self.config_file_name,
            start_directory.display(),
            self.search_directories.len()
        ))
    }

    /// Build a config reader using these settings.
    pub fn config_reader<R: ModuleRegistry>(&self, registry: R) -> ConfigReader<R> {
        ConfigReader::new(registry)
            .with_max_include_depth(self.max_include_depth)
            .with_extra_line_content(self.extra_line_content.clone())
    }
}
