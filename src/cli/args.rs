//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the access configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Database directory, overriding the configuration file
    #[arg(short, long)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a user identity
    CreateIdentity { name: String },
    /// Drop a user identity and every permission granted to it
    DropIdentity { name: String },
    /// Create a role
    CreateRole { name: String },
    /// Drop a role, its memberships and its permissions
    DropRole { name: String },
    /// Add an identity to a role
    AddMember { identity: String, role: String },
    /// Remove an identity from a role
    RemoveMember { identity: String, role: String },
    /// Grant actions on a securable
    Grant {
        /// Comma-separated actions, e.g. SELECT,INSERT
        #[arg(short, long, required = true)]
        actions: String,
        /// Securable path: schema, schema.object or schema.object.column
        #[arg(short = 'o', long = "on", required = true)]
        securable: String,
        /// Identity or role receiving the permission
        #[arg(short, long = "to", required = true)]
        principal: String,
    },
    /// Deny actions on a securable
    Deny {
        #[arg(short, long, required = true)]
        actions: String,
        #[arg(short = 'o', long = "on", required = true)]
        securable: String,
        #[arg(short, long = "to", required = true)]
        principal: String,
    },
    /// Remove grants and denies on a securable
    Revoke {
        #[arg(short, long, required = true)]
        actions: String,
        #[arg(short = 'o', long = "on", required = true)]
        securable: String,
        #[arg(short, long = "from", required = true)]
        principal: String,
    },
    /// Decide whether an identity may perform an action
    Check {
        #[arg(short, long, required = true)]
        identity: String,
        #[arg(short, long, required = true)]
        action: String,
        #[arg(short = 'o', long = "on", required = true)]
        securable: String,
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: OutputFormat,
    },
    /// Decide access for each column of an object
    CheckColumns {
        #[arg(short, long, required = true)]
        identity: String,
        #[arg(short, long, required = true)]
        action: String,
        /// Object path: schema.object
        #[arg(short = 'o', long = "on", required = true)]
        object: String,
        /// Column names (comma-separated)
        #[arg(short, long, required = true, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Show the roles of an identity
    Roles { identity: String },
    /// List recorded facts, optionally for one principal
    ListFacts {
        #[arg(short, long)]
        principal: Option<String>,
    },
    /// Apply a JSON policy script
    Apply {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Print every identity, role and fact as JSON
    Export,
}
