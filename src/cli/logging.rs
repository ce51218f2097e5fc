//! Diagnostic logging
//!
//! Logs go to stderr so they never interleave with the operator console on
//! stdout. `RUST_LOG` wins over the configured level.

use crate::cli::{Error, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "pumpwise.log";

/// Build the filter from `RUST_LOG`, falling back to `level`
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| Error::Logging(format!("invalid log level '{}': {}", level, e))),
    }
}

/// Shared owner of the file writer's guard
///
/// Buffered file lines are written out when the guard drops. Clones can be
/// handed to an interrupt handler that exits without unwinding.
#[derive(Clone, Default)]
pub struct LogFlush(Arc<Mutex<Option<WorkerGuard>>>);

impl LogFlush {
    pub fn new(guard: Option<WorkerGuard>) -> Self {
        Self(Arc::new(Mutex::new(guard)))
    }

    /// Drop the guard, blocking until buffered lines are written
    ///
    /// Returns whether there was anything to flush; later calls do nothing.
    pub fn flush(&self) -> bool {
        let guard = match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        guard.is_some()
    }
}

/// Install the global subscriber
///
/// With `log_dir` set, a daily-rolling file is written as well. Keep the
/// returned handle alive until exit, or flush it, or buffered lines are lost.
pub fn init(level: &str, log_dir: Option<&Path>) -> Result<LogFlush> {
    let filter = env_filter(level)?;
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(LogFlush::new(guard))
}
