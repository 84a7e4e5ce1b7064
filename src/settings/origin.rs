use std::{
    env::current_dir,
    path::{Path, PathBuf},
};

use miette::{Context, IntoDiagnostic, Result};


/// Settings file location relative to the current directory.
pub const DEFAULT_SETTINGS_FILE_PATH: &str = "data/settings.toml";


/// Where a set of settings was loaded from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SettingsOrigin {
    /// Settings file, `None` for the built-in defaults.
    pub file_path: Option<PathBuf>,

    /// Directory relative paths in the settings are resolved against.
    pub directory: PathBuf,
}

impl SettingsOrigin {
    /// Settings read from `file_path`; relative paths follow the file.
    pub fn from_file<P: Into<PathBuf>>(file_path: P) -> Self {
        let file_path = file_path.into();
        let directory = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self {
            file_path: Some(file_path),
            directory,
        }
    }

    /// Settings that don't come from a file; relative paths follow the
    /// current directory.
    pub fn current_directory() -> Result<Self> {
        let directory = current_dir()
            .into_diagnostic()
            .wrap_err("Could not get the current directory.")?;

        Ok(Self {
            file_path: None,
            directory,
        })
    }

    /// The default settings file, `./data/settings.toml`. The file may not
    /// exist.
    pub fn default_file() -> Result<Self> {
        let current = Self::current_directory()?;
        Ok(Self::from_file(current.directory.join(DEFAULT_SETTINGS_FILE_PATH)))
    }

    /// Anchor a path taken from the settings.
    pub fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_follow_the_settings_file() {
        let origin = SettingsOrigin::from_file("/etc/surveyor/settings.toml");

        assert_eq!(origin.directory, Path::new("/etc/surveyor"));
        assert_eq!(origin.resolve_path("logs"), Path::new("/etc/surveyor/logs"));
        assert_eq!(origin.resolve_path("/var/log"), Path::new("/var/log"));
    }

    #[test]
    fn bare_file_name_resolves_against_current_directory() {
        let origin = SettingsOrigin::from_file("settings.toml");

        assert_eq!(origin.resolve_path("logs"), Path::new("./logs"));
    }

    #[test]
    fn default_file_is_under_data() {
        let origin = SettingsOrigin::default_file().unwrap();

        assert!(origin
            .file_path
            .as_ref()
            .is_some_and(|path| path.ends_with("data/settings.toml")));
        assert!(origin.directory.ends_with("data"));
    }
}
