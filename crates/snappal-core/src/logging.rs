//! Tracing initialization.
//!
//! `SNAPPAL_LOG` takes an `EnvFilter` directive (e.g. `snappal_core=debug`);
//! the default is `warn`. Logs go to stderr so they never mix with command
//! output. Setting `SNAPPAL_LOG_FILE` additionally writes plain-text logs to
//! that file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_ENV: &str = "SNAPPAL_LOG";
const LOG_FILE_ENV: &str = "SNAPPAL_LOG_FILE";
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber.
///
/// Returns the file writer guard when a log file is configured; keep it alive
/// for the lifetime of the process so buffered lines are flushed. Calling this
/// more than once is harmless: later calls leave the first subscriber in place.
pub fn init() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_writer, guard) = match std::env::var_os(LOG_FILE_ENV) {
        Some(path) => match file_writer(Path::new(&path)) {
            Some((writer, guard)) => (Some(writer), Some(guard)),
            None => (None, None),
        },
        None => (None, None),
    };

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok()?;

    guard
}

fn file_writer(path: &Path) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path.file_name()?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Some(tracing_appender::non_blocking(appender))
}
