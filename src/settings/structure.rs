use std::fs;
use std::path::{Path, PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;
use tracing::debug;

pub use self::logging::{LogFileSettings, LoggingSettings, CONSOLE_FILTER_ENV_VAR};
use self::logging::UnresolvedLoggingSettings;
pub use self::reader::ReaderSettings;
use self::reader::UnresolvedReaderSettings;
use super::{
    origin::{SettingsOrigin, DEFAULT_SETTINGS_FILE_PATH},
    traits::ResolvableSettings,
};

mod logging;
mod reader;



#[derive(Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
struct UnresolvedSettings {
    logging: UnresolvedLoggingSettings,

    reader: UnresolvedReaderSettings,
}


/// All program settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where these settings were loaded from.
    pub origin: SettingsOrigin,

    /// Logging-related settings.
    pub logging: LoggingSettings,

    /// Finding and reading config files.
    pub reader: ReaderSettings,
}


impl ResolvableSettings for UnresolvedSettings {
    type Resolved = Settings;

    fn resolve(self, origin: &SettingsOrigin) -> Result<Self::Resolved> {
        let logging = self
            .logging
            .resolve(origin)
            .wrap_err("Failed to resolve logging table.")?;

        let reader = self
            .reader
            .resolve(origin)
            .wrap_err("Failed to resolve reader table.")?;

        Ok(Settings {
            origin: origin.clone(),
            logging,
            reader,
        })
    }
}


impl Settings {
    /// Parse settings from a TOML string as if loaded from `origin`.
    pub fn load_from_str(settings_string: &str, origin: SettingsOrigin) -> Result<Self> {
        let unresolved_settings = toml::from_str::<UnresolvedSettings>(settings_string)
            .into_diagnostic()
            .wrap_err("Could not parse settings file!")?;

        unresolved_settings
            .resolve(&origin)
            .wrap_err("Failed to resolve settings.")
    }

    /// Load the settings from a specific file path.
    pub fn load_from_path<S: AsRef<Path>>(settings_file_path: S) -> Result<Self> {
        let settings_file_path = settings_file_path.as_ref();

        let settings_string = fs::read_to_string(settings_file_path)
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not read settings file at {}.",
                    settings_file_path.display()
                )
            })?;

        let settings_file_path: PathBuf = dunce::canonicalize(settings_file_path)
            .into_diagnostic()
            .wrap_err("Could not canonicalize settings file path!")?;

        Self::load_from_str(&settings_string, SettingsOrigin::from_file(settings_file_path))
    }

    /// Built-in defaults, as if an empty settings file had been found in the
    /// current directory.
    pub fn defaults() -> Result<Self> {
        UnresolvedSettings::default()
            .resolve(&SettingsOrigin::current_directory()?)
            .wrap_err("Failed to resolve default settings.")
    }

    /// Load the settings from the default path (`./data/settings.toml`), or
    /// fall back to the built-in defaults if there is no file there.
    pub fn load_from_default_path_or_defaults() -> Result<Self> {
        let default_origin = SettingsOrigin::default_file()
            .wrap_err("Could not determine default settings file path.")?;

        match default_origin.file_path {
            Some(file_path) if file_path.is_file() => Settings::load_from_path(file_path),
            _ => {
                debug!("No settings file at {}, using defaults.", DEFAULT_SETTINGS_FILE_PATH);
                Settings::defaults()
            }
        }
    }
}
