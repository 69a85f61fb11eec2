//! Installs the global `tracing` subscriber.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::Error;

/// Log to stderr at `level` and, if `log_file` is given, append everything at
/// `DEBUG` and above to that file.
///
/// The `RUST_LOG` environment variable overrides `level` for the stderr output.
///
/// # Errors
/// Returns [Error::Io] if the log file cannot be opened or a global subscriber
/// was already installed.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), Error> {
    let stderr_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let debug_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(debug_log)
        .try_init()
        .map_err(|error| Error::Io(error.to_string()))
}
