//! Feature-specific logging macros and utilities
//!
//! Each component of the access control core logs under its own target so
//! that, for example, evaluator decisions can be traced at debug level while
//! the rest of the crate stays at info.

/// Feature categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFeature {
    Directory,
    Policy,
    Evaluator,
    Database,
    Cli,
}

impl LogFeature {
    pub const ALL: [LogFeature; 5] = [
        LogFeature::Directory,
        LogFeature::Policy,
        LogFeature::Evaluator,
        LogFeature::Database,
        LogFeature::Cli,
    ];

    /// Get the target string for this feature
    pub fn target(&self) -> &'static str {
        match self {
            LogFeature::Directory => "fold_access::directory",
            LogFeature::Policy => "fold_access::policy",
            LogFeature::Evaluator => "fold_access::evaluator",
            LogFeature::Database => "fold_access::database",
            LogFeature::Cli => "fold_access::cli",
        }
    }

    /// Name used for this feature in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            LogFeature::Directory => "directory",
            LogFeature::Policy => "policy",
            LogFeature::Evaluator => "evaluator",
            LogFeature::Database => "database",
            LogFeature::Cli => "cli",
        }
    }

    pub fn from_name(name: &str) -> Option<LogFeature> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

// Principal directory logging macros
#[macro_export]
macro_rules! log_directory_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_access::directory", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_directory_info {
    ($($arg:tt)*) => {
        log::info!(target: "fold_access::directory", $($arg)*)
    };
}

// Policy store logging macros
#[macro_export]
macro_rules! log_policy_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_access::policy", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_policy_info {
    ($($arg:tt)*) => {
        log::info!(target: "fold_access::policy", $($arg)*)
    };
}

// Evaluator logging macros
#[macro_export]
macro_rules! log_evaluator_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_access::evaluator", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_evaluator_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "fold_access::evaluator", $($arg)*)
    };
}

// Database logging macros
#[macro_export]
macro_rules! log_database_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "fold_access::database", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_database_info {
    ($($arg:tt)*) => {
        log::info!(target: "fold_access::database", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_database_error {
    ($($arg:tt)*) => {
        log::error!(target: "fold_access::database", $($arg)*)
    };
}

// CLI logging macros
#[macro_export]
macro_rules! log_cli_info {
    ($($arg:tt)*) => {
        log::info!(target: "fold_access::cli", $($arg)*)
    };
}
