use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::settings::LoggingSettings;


/// Set up console logging (to stderr) and, if the settings ask for it,
/// daily-rotated file logging.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for as long as the program runs. There is no guard without a log file.
pub fn initialize_tracing(
    settings: &LoggingSettings,
    log_file_name_prefix: &str,
) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(settings.console_output_level_filter()?);

    let mut guard = None;
    let file_layer = match settings.log_file.as_ref() {
        Some(log_file) => {
            std::fs::create_dir_all(&log_file.directory)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to create missing log directory at {}.",
                        log_file.directory.display()
                    )
                })?;

            let file_appender =
                tracing_appender::rolling::daily(&log_file.directory, log_file_name_prefix);
            let (non_blocking_file_writer, file_guard) =
                tracing_appender::non_blocking(file_appender);
            guard = Some(file_guard);

            Some(
                fmt::layer()
                    .with_writer(non_blocking_file_writer)
                    .with_ansi(false)
                    .with_filter(log_file.level_filter()?),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install global tracing subscriber.")?;

    Ok(guard)
}
