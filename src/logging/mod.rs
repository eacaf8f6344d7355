//! # Logging
//!
//! The crate logs through the `log` facade. [`LoggingSystem`] installs an
//! `env_logger` backend configured from [`LogConfig`]; `RUST_LOG`, when set,
//! is applied on top of the configured filters.

pub mod config;
pub mod features;

pub use config::LogConfig;
pub use features::LogFeature;

use once_cell::sync::OnceCell;

/// Configuration the logger was installed with
static LOGGING_CONFIG: OnceCell<LogConfig> = OnceCell::new();

pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize the logging system with default configuration
    pub fn init_default() -> Result<(), LoggingError> {
        Self::init_with_config(LogConfig::default())
    }

    /// Initialize the logging system with a custom configuration
    pub fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        if LOGGING_CONFIG.get().is_some() {
            return Err(LoggingError::AlreadyInitialized);
        }

        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.default_level()?);
        for (target, level) in config.feature_filters()? {
            builder.filter_module(&target, level);
        }
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        builder.write_style(if config.general.enable_colors {
            env_logger::WriteStyle::Auto
        } else {
            env_logger::WriteStyle::Never
        });
        if !config.general.include_timestamp {
            builder.format_timestamp(None);
        }

        builder
            .try_init()
            .map_err(|e| LoggingError::Config(format!("Failed to install logger: {}", e)))?;
        LOGGING_CONFIG
            .set(config)
            .map_err(|_| LoggingError::AlreadyInitialized)
    }

    /// Get the configuration the logger was installed with
    pub fn get_config() -> Option<&'static LogConfig> {
        LOGGING_CONFIG.get()
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LoggingError> for crate::error::AccessError {
    fn from(error: LoggingError) -> Self {
        crate::error::AccessError::Config(error.to_string())
    }
}
