//! Configuration for the logging system
//!
//! Logging settings live in the `[logging]` table of the access configuration
//! file and can be overridden from the environment.

use super::features::LogFeature;
use super::LoggingError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Environment variable overriding the default level
pub const LOG_LEVEL_ENV: &str = "FOLD_ACCESS_LOG_LEVEL";

/// Main logging configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// General logging settings
    pub general: GeneralConfig,
    /// Feature-specific log levels, keyed by feature name (`evaluator`, ...)
    pub features: HashMap<String, String>,
}

/// General logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log level for all modules
    pub default_level: String,
    /// Enable colored output
    pub enable_colors: bool,
    /// Include timestamps
    pub include_timestamp: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            features: Self::default_features(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_level: "INFO".to_string(),
            enable_colors: true,
            include_timestamp: true,
        }
    }
}

impl LogConfig {
    fn default_features() -> HashMap<String, String> {
        let mut features = HashMap::new();
        features.insert(LogFeature::Evaluator.name().to_string(), "INFO".to_string());
        features.insert(LogFeature::Database.name().to_string(), "WARN".to_string());
        features
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            self.general.default_level = level;
        }
    }

    /// Parsed default level
    pub fn default_level(&self) -> Result<LevelFilter, LoggingError> {
        parse_level(&self.general.default_level)
    }

    /// Parsed per-feature levels as `(target, level)` pairs. Unknown feature
    /// names are treated as raw module targets.
    pub fn feature_filters(&self) -> Result<Vec<(String, LevelFilter)>, LoggingError> {
        let mut filters = Vec::with_capacity(self.features.len());
        for (feature, level) in &self.features {
            let target = LogFeature::from_name(feature)
                .map(|f| f.target().to_string())
                .unwrap_or_else(|| feature.clone());
            filters.push((target, parse_level(level)?));
        }
        filters.sort();
        Ok(filters)
    }

    /// Validate every configured level
    pub fn validate(&self) -> Result<(), LoggingError> {
        self.default_level()?;
        self.feature_filters()?;
        Ok(())
    }
}

pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| LoggingError::Config(format!("Invalid log level: {}", level)))
}
