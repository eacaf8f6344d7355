//! Configuration for the access control core
//!
//! Settings are read from a TOML file and can be overridden from the
//! environment.

pub mod access_config;

pub use access_config::{load_access_config, AccessConfig, CONFIG_PATH_ENV, STORAGE_PATH_ENV};
