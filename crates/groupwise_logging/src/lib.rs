//! Shared logging utilities for the groupwise binary.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "groupwise=info,groupwise_core=info";
const LOG_FILE_NAME: &str = "groupwise.log";
const HOME_ENV: &str = "GROUPWISE_HOME";

/// Logging configuration for groupwise binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Machine-readable stdout; keep the console quiet
    pub json_output: bool,
}

/// Initialize tracing with a daily rolling file and stderr output.
///
/// The returned guard flushes the file writer on drop; hold it for the life
/// of the process. A log directory that cannot be created only disables the
/// file layer.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let mut guard = None;
    let file_layer = match ensure_logs_dir() {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(env_filter()),
            )
        }
        Err(err) => {
            eprintln!("Warning: failed to create logs directory: {:#}", err);
            None
        }
    };

    let console_filter = match console_directive(&config) {
        Some(directive) => EnvFilter::new(directive),
        None => env_filter(),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .with_context(|| format!("Failed to install tracing subscriber for {}", config.app_name))?;

    Ok(guard)
}

/// `RUST_LOG`, else the default directives
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Console filter override, `None` to follow the file filter
fn console_directive(config: &LogConfig<'_>) -> Option<&'static str> {
    if config.verbose {
        Some("groupwise=debug,groupwise_core=debug")
    } else if config.json_output {
        Some("warn")
    } else {
        None
    }
}

/// Get the groupwise home directory: ~/.groupwise
pub fn groupwise_home() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV) {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".groupwise")
}

/// Get the logs directory: ~/.groupwise/logs
pub fn logs_dir() -> PathBuf {
    groupwise_home().join("logs")
}

/// Get the settings file: ~/.groupwise/config.toml
pub fn config_path() -> PathBuf {
    groupwise_home().join("config.toml")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(verbose: bool, json_output: bool) -> LogConfig<'static> {
        LogConfig {
            app_name: "groupwise",
            verbose,
            json_output,
        }
    }

    #[test]
    fn test_console_directive() {
        assert_eq!(console_directive(&config(false, false)), None);
        assert_eq!(console_directive(&config(false, true)), Some("warn"));
        // Verbose wins over JSON mode
        assert!(console_directive(&config(true, true)).unwrap().contains("debug"));
    }

    #[test]
    fn test_home_override() {
        let temp = tempfile::TempDir::new().unwrap();
        std::env::set_var(HOME_ENV, temp.path());

        assert_eq!(groupwise_home(), temp.path());
        assert_eq!(config_path(), temp.path().join("config.toml"));
        let logs = ensure_logs_dir().unwrap();
        assert!(logs.is_dir());
        assert_eq!(logs, temp.path().join("logs"));

        std::env::remove_var(HOME_ENV);
    }
}
