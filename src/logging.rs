//! Tracing setup.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// Logs go to stderr so that `--format json` keeps stdout clean. With a log
/// file, a second plain-text layer appends to it; the returned guard must be
/// held until exit or buffered lines are lost. A log file that cannot be
/// opened is reported and logging continues on stderr only.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut open_error = None;
    let (file_layer, guard) = match log_file.map(open_log_file) {
        Some(Ok(file)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Some(Err(err)) => {
            open_error = Some(err);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .with(filter)
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    if let Some(path) = log_file {
        match open_error {
            Some(err) => warn!(
                path = %path.display(),
                error = %err,
                "failed to open log file, logging to stderr only"
            ),
            None => info!(path = %path.display(), "logging to file"),
        }
    }

    Ok(guard)
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
