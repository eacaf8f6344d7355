//! Column-aware role-based access control.
//!
//! Identities belong to roles; GRANT and DENY facts attach actions to
//! schemas, objects and columns; the evaluator decides every request with
//! DENY-wins, fail-closed semantics and reports which fact decided it.
//!
//! ```
//! use fold_access::{AccessManager, Action, SecurablePath};
//!
//! let manager = AccessManager::in_memory();
//! manager.create_identity("HRManagerUser").unwrap();
//! manager.create_role("HRRole").unwrap();
//! manager.add_membership("HRManagerUser", "HRRole").unwrap();
//! manager.grant("HRRole", Action::Read, &"GA1".parse().unwrap()).unwrap();
//!
//! let target: SecurablePath = "GA1.EmployeeData".parse().unwrap();
//! assert!(manager.evaluate("HRManagerUser", Action::Read, &target).unwrap().is_allowed());
//! ```

pub mod cli;
pub mod config;
pub mod db_operations;
pub mod error;
pub mod logging;
pub mod permissions;

pub use config::{load_access_config, AccessConfig};
pub use db_operations::DbOperations;
pub use error::{AccessError, AccessResult};
pub use permissions::{
    AccessEvaluator, AccessManager, AccessRequest, AccessSnapshot, AccessState, Action,
    ColumnPermissionResult, Decision, Effect, PolicyConflictAudit, PolicyFact, PolicyScript,
    PolicyStore, PrincipalDirectory, SecurablePath, Specificity,
};
