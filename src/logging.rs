use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Installs the global subscriber writing to the configured log file.
///
/// Returns `None` when no file is configured. The guard flushes pending lines
/// on drop and must be held until exit.
pub fn init_tracing(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let Some(path) = log.file.as_deref() else {
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Logging(format!("{} is not a file path", path.display())))?;
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)
            .map_err(|e| Error::Logging(format!("invalid log level {:?}: {}", log.level, e)))?,
    };
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(Some(guard))
}
