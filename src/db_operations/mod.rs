// Persistence for the access control core
mod access_operations;
pub mod core;
pub mod error_utils;

#[cfg(test)]
mod tests;

pub use access_operations::fact_key;
pub use self::core::DbOperations;
pub use error_utils::ErrorUtils;
