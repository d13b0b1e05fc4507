pub mod config;
pub mod error;

pub use config::{Config, StorageConfig, UiConfig, ValidationResult, WeatherConfig};
pub use error::{
    AppError, ConfigError, NetworkError, ReqwestErrorExt, StorageError, WeatherError,
};

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging.
///
/// With `log_file` set, events are appended to that file instead of stdout so
/// they do not interfere with the terminal UI. The filter comes from `RUST_LOG`
/// and defaults to `info`.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
        }
    }

    tracing::info!("Skylook core initialized");
    Ok(())
}
