//! Command line interface for administering and querying access policies

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::run;
