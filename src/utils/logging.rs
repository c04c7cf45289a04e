//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` according to a [`LoggingConfig`].
//! `RUST_LOG` overrides the configured level when set. Initialization is
//! idempotent: only the first successful call installs a subscriber.

use std::fs::OpenOptions;
use std::sync::{Mutex, OnceLock};

use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{IibinError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

static INITIALIZED: OnceLock<()> = OnceLock::new();

fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy()
}

/// Install the global subscriber described by `config`
///
/// # Errors
/// Returns `ConfigError` if the configuration is invalid, the log file
/// cannot be opened, or another subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(IibinError::ConfigError(errors.join("; ")));
    }

    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.log_to_console {
        let layer = if config.json_format {
            fmt::layer().json().with_filter(filter_for(config)).boxed()
        } else {
            fmt::layer().with_filter(filter_for(config)).boxed()
        };
        layers.push(layer);
    }

    if config.log_to_file {
        if let Some(path) = &config.log_file_path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| IibinError::ConfigError(format!("Failed to open log file: {e}")))?;
            let writer = Mutex::new(file);
            let layer = if config.json_format {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_filter(filter_for(config))
                    .boxed()
            } else {
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter_for(config))
                    .boxed()
            };
            layers.push(layer);
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| IibinError::ConfigError(format!("Failed to install subscriber: {e}")))?;

    let _ = INITIALIZED.set(());
    debug!(app = %config.app_name, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let config = LoggingConfig {
            log_to_console: false,
            log_to_file: false,
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(IibinError::ConfigError(_))
        ));
    }
}
