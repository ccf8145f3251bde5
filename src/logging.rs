//! Logging setup for the `tablespec` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to
//! the binary (or to whatever application embeds the crate). [`init`] writes
//! human-readable or JSON lines to stderr and, when a directory is configured,
//! to a daily-rotated file as well.
//!
//! ```no_run
//! use tablespec::config::LoggingConfig;
//!
//! tablespec::logging::init(&LoggingConfig::default()).expect("logging");
//! tracing::info!("ready");
//! ```

use crate::config::LoggingConfig;
use crate::error::{Result, ResultExt as _, TablespecError};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_FILE_PREFIX: &str = "tablespec";

type BoxedLayer = Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync>;

/// Platform data directory for log files, e.g. `~/.local/share/tablespec/logs`.
///
/// # Errors
///
/// Returns an error if the platform has no data directory.
pub fn default_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir()
        .ok_or_else(|| TablespecError::Logging("Failed to determine data directory".to_owned()))?;
    Ok(base_dir.join("tablespec").join("logs"))
}

/// Path of today's log file inside `dir`.
pub fn current_log_path(dir: &Path) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    dir.join(format!("{LOG_FILE_PREFIX}.{today}.log"))
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `config.level` when set.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid, the log directory
/// cannot be created, or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            TablespecError::Logging(format!("Invalid log level '{}': {e}", config.level))
        })?;

    let mut layers = vec![console_layer(config.json)];
    if let Some(dir) = &config.directory {
        layers.push(file_layer(dir, config.json)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| TablespecError::Logging(e.to_string()))?;

    match &config.directory {
        Some(dir) => tracing::debug!(path = %current_log_path(dir).display(), "logging initialized"),
        None => tracing::debug!("logging initialized"),
    }
    Ok(())
}

fn console_layer(json: bool) -> BoxedLayer {
    let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn file_layer(dir: &Path, json: bool) -> Result<BoxedLayer> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| TablespecError::Logging(format!("Failed to create log file appender: {e}")))?;

    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(appender);

    Ok(if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    })
}
