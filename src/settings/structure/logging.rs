use std::path::PathBuf;

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::settings::{origin::SettingsOrigin, traits::ResolvableSettings};


/// Environment variable that overrides the console level filter.
pub const CONSOLE_FILTER_ENV_VAR: &str = "SURVEYOR_LOG";


#[derive(Deserialize, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub(super) struct UnresolvedLoggingSettings {
    console_output_level_filter: String,

    log_file_output_level_filter: String,

    /// Missing or blank turns file logging off.
    log_file_output_directory: Option<String>,
}

impl Default for UnresolvedLoggingSettings {
    fn default() -> Self {
        Self {
            console_output_level_filter: "info".to_string(),
            log_file_output_level_filter: "debug".to_string(),
            log_file_output_directory: None,
        }
    }
}


/// Rolling log file output.
#[derive(Clone, Debug)]
pub struct LogFileSettings {
    pub level_filter: String,

    pub directory: PathBuf,
}

impl LogFileSettings {
    pub fn level_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.level_filter).into_diagnostic()
    }
}


#[derive(Clone, Debug)]
pub struct LoggingSettings {
    pub console_output_level_filter: String,

    /// `None` if only the console is logged to.
    pub log_file: Option<LogFileSettings>,
}

impl LoggingSettings {
    /// The console filter, taken from [`CONSOLE_FILTER_ENV_VAR`] when that is
    /// set to a valid filter.
    pub fn console_output_level_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_env(CONSOLE_FILTER_ENV_VAR) {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.console_output_level_filter).into_diagnostic(),
        }
    }
}


fn checked_level_filter(field: &str, directives: String) -> Result<String> {
    EnvFilter::try_new(&directives)
        .into_diagnostic()
        .wrap_err_with(|| miette!("Field {field} is not a valid level filter: \"{directives}\""))?;

    Ok(directives)
}

impl ResolvableSettings for UnresolvedLoggingSettings {
    type Resolved = LoggingSettings;

    fn resolve(self, origin: &SettingsOrigin) -> Result<Self::Resolved> {
        let Self {
            console_output_level_filter,
            log_file_output_level_filter,
            log_file_output_directory,
        } = self;

        let console_output_level_filter =
            checked_level_filter("console_output_level_filter", console_output_level_filter)?;

        let log_file = match log_file_output_directory.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(directory) => Some(LogFileSettings {
                level_filter: checked_level_filter(
                    "log_file_output_level_filter",
                    log_file_output_level_filter,
                )?,
                directory: origin.resolve_path(directory),
            }),
        };

        Ok(LoggingSettings {
            console_output_level_filter,
            log_file,
        })
    }
}
