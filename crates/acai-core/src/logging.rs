//! Tracing setup.
//!
//! Logs go to a daily-rolling file under `${ACAI_HOME}/logs` so stdout stays
//! reserved for command output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{self, Config};

const LOG_FILE_PREFIX: &str = "acai.log";

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// lifetime of the process.
///
/// # Errors
/// Returns an error if the log directory cannot be created or the filter
/// directive is invalid.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    init_in(&config::paths::logs_dir(), &config.log_filter())
}

/// Installs the global subscriber writing into `dir`.
///
/// # Errors
/// See [`init`].
pub fn init_in(dir: &Path, filter: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let filter =
        EnvFilter::try_new(filter).with_context(|| format!("Invalid log filter '{filter}'"))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_init_rejects_bad_filter() {
        let dir = tempdir().unwrap();
        let err = init_in(dir.path(), "acai_core=notalevel").unwrap_err();
        assert!(err.to_string().contains("Invalid log filter"));
    }

    #[test]
    fn test_init_creates_log_dir() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        let _guard = init_in(&logs, "info").unwrap();
        assert!(logs.is_dir());
    }
}
