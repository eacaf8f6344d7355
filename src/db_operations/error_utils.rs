//! Error handling utilities for database operations
//!
//! Keeps error messages from the persistence layer consistent.

use crate::error::AccessError;

/// Utility functions for common error handling patterns in database operations
pub struct ErrorUtils;

impl ErrorUtils {
    /// Creates a serialization error with consistent formatting
    pub fn serialization_error(context: &str, error: serde_json::Error) -> AccessError {
        AccessError::Serialization(format!("Serialization failed for {}: {}", context, error))
    }

    /// Creates a deserialization error with consistent formatting
    pub fn deserialization_error(context: &str, error: serde_json::Error) -> AccessError {
        AccessError::Serialization(format!("Deserialization failed for {}: {}", context, error))
    }

    /// Creates a database operation error with consistent formatting
    pub fn database_error(operation: &str, error: sled::Error) -> AccessError {
        AccessError::Database(format!("Database {} failed: {}", operation, error))
    }

    /// Creates a tree operation error with consistent formatting
    pub fn tree_error(operation: &str, tree_name: &str, error: sled::Error) -> AccessError {
        AccessError::Database(format!(
            "Tree {} operation on '{}' failed: {}",
            operation, tree_name, error
        ))
    }

    /// Helper for converting sled errors in database operations
    pub fn from_sled_error(operation: &str) -> impl Fn(sled::Error) -> AccessError + '_ {
        move |e| Self::database_error(operation, e)
    }

    /// Helper for converting serialization errors
    pub fn from_serialization_error(
        context: &str,
    ) -> impl Fn(serde_json::Error) -> AccessError + '_ {
        move |e| Self::serialization_error(context, e)
    }

    /// Helper for converting deserialization errors
    pub fn from_deserialization_error(
        context: &str,
    ) -> impl Fn(serde_json::Error) -> AccessError + '_ {
        move |e| Self::deserialization_error(context, e)
    }
}
