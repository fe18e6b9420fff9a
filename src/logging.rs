//! Logging configuration using the tracing ecosystem.
//!
//! The library itself only emits `tracing` events. Applications embedding it
//! can call [`init`] to install a subscriber with:
//! - Environment-based log level configuration
//! - Optional daily rotated log files
//! - Span-based context for async operations

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "jira_client=info,warn";

/// How logs are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
    /// Write to daily rotated files instead of stderr.
    pub to_file: bool,
    /// Directory of the log files; the local data directory when `None`.
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_LOG_FILTER.to_string(),
            to_file: false,
            directory: None,
        }
    }
}

/// Initialize the logging system.
///
/// # Log Directory
///
/// File logs are stored in the platform-specific local data directory unless
/// [`LogSettings::directory`] is set:
/// - Linux: `~/.local/share/jira-client/logs/`
/// - macOS: `~/Library/Application Support/jira-client/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\jira-client\logs\`
///
/// # Log Levels
///
/// Configure via `RUST_LOG` environment variable:
/// - `RUST_LOG=jira_client=debug` - every request and cache decision
/// - `RUST_LOG=jira_client=trace` - cache keys and upload details
///
/// # Errors
///
/// Returns an error if:
/// - The log directory cannot be determined or created
/// - A global subscriber was already installed
///
/// # Example
///
/// ```no_run
/// use jira_client::logging::{self, LogSettings};
///
/// logging::init(&LogSettings::default()).expect("Failed to initialize logging");
/// ```
pub fn init(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_filter));

    if settings.to_file {
        let log_dir = match &settings.directory {
            Some(dir) => dir.clone(),
            None => get_log_directory()?,
        };
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "jira-client.log");
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::debug!(log_dir = %log_dir.display(), "Log directory");
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jira-client logging initialized");
    Ok(())
}

/// Like [`init`], but checks for an installed global subscriber before
/// touching the log directory.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed or [`init`] fails.
pub fn try_init(settings: &LogSettings) -> anyhow::Result<()> {
    if tracing::dispatcher::has_been_set() {
        anyhow::bail!("a global tracing subscriber is already installed");
    }
    init(settings)
}

/// Get the log directory path.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jira-client").join("logs"))
}

/// Get the default path where file logs are stored.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_has_expected_structure() {
        let dir = get_log_directory().unwrap();
        assert!(dir.ends_with("jira-client/logs"));
    }

    #[test]
    fn test_log_directory_public_function() {
        let dir = log_directory();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("jira-client/logs"));
    }

    #[test]
    fn test_default_settings() {
        let settings = LogSettings::default();
        assert_eq!(settings.default_filter, "jira_client=info,warn");
        assert!(!settings.to_file);
        assert!(settings.directory.is_none());
    }

    #[test]
    fn test_try_init_fails_when_installed() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            to_file: true,
            directory: Some(dir.path().to_path_buf()),
            ..LogSettings::default()
        };
        assert!(try_init(&settings).is_ok());

        let err = try_init(&settings).unwrap_err();
        assert!(err.to_string().contains("already installed"));
    }
}
