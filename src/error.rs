use std::io;
use thiserror::Error;

/// Unified error type for the access control core.
///
/// Authorization outcomes are not errors: a DENY is a normal [`Decision`].
/// `AccessDenied` only appears when a caller converts a DENY into a
/// rejection with [`Decision::into_result`].
///
/// [`Decision`]: crate::permissions::types::Decision
/// [`Decision::into_result`]: crate::permissions::types::Decision::into_result
#[derive(Debug, Error)]
pub enum AccessError {
    /// The identity is not present in the principal directory
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// The role is not present in the principal directory
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Neither an identity nor a role carries this name
    #[error("Unknown principal: {0}")]
    UnknownPrincipal(String),

    /// An identity or role with this name already exists
    #[error("Duplicate principal: {0}")]
    DuplicatePrincipal(String),

    /// Malformed action or securable path
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The evaluator returned DENY and the caller asked for a hard failure
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A thread panicked while holding one of the manager locks
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<sled::Error> for AccessError {
    fn from(error: sled::Error) -> Self {
        AccessError::Database(error.to_string())
    }
}

impl From<serde_json::Error> for AccessError {
    fn from(error: serde_json::Error) -> Self {
        AccessError::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AccessError {
    fn from(error: toml::de::Error) -> Self {
        AccessError::Config(error.to_string())
    }
}

/// Result type alias for operations that can result in an [`AccessError`]
pub type AccessResult<T> = Result<T, AccessError>;
