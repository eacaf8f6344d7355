use crate::error::{AccessError, AccessResult};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "FOLD_ACCESS_CONFIG";
/// Environment variable overriding `storage_path`
pub const STORAGE_PATH_ENV: &str = "FOLD_ACCESS_STORAGE_PATH";
/// Configuration file used when neither an explicit path nor the environment
/// variable is given
pub const DEFAULT_CONFIG_PATH: &str = "config/access_config.toml";

/// Top-level configuration.
///
/// ```toml
/// storage_path = "data/access"
///
/// [logging.general]
/// default_level = "INFO"
///
/// [logging.features]
/// evaluator = "DEBUG"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Directory of the sled database. `None` keeps everything in memory.
    pub storage_path: Option<PathBuf>,
    pub logging: LogConfig,
}

impl AccessConfig {
    /// Load configuration from a TOML file and apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> AccessResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: AccessConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn with_storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(STORAGE_PATH_ENV) {
            if !path.trim().is_empty() {
                self.storage_path = Some(PathBuf::from(path));
            }
        }
        self.logging.apply_env_overrides();
    }

    pub fn validate(&self) -> AccessResult<()> {
        if let Some(path) = &self.storage_path {
            if path.as_os_str().is_empty() {
                return Err(AccessError::Config(
                    "storage_path cannot be empty".to_string(),
                ));
            }
        }
        self.logging.validate()?;
        Ok(())
    }

    pub fn to_toml(&self) -> AccessResult<String> {
        toml::to_string_pretty(self).map_err(|e| AccessError::Config(e.to_string()))
    }
}

/// Load the access configuration.
///
/// The path is `path`, else the `FOLD_ACCESS_CONFIG` environment variable,
/// else `config/access_config.toml`. A missing file yields the defaults with
/// environment overrides applied; a file that exists but does not parse is an
/// error.
pub fn load_access_config(path: Option<&str>) -> AccessResult<AccessConfig> {
    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    if Path::new(&config_path).exists() {
        AccessConfig::from_file(&config_path).map_err(|e| {
            log::error!("Failed to load access configuration {}: {}", config_path, e);
            e
        })
    } else {
        log::info!(
            "No configuration at {}, using in-memory defaults",
            config_path
        );
        let mut config = AccessConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
