// permissions module

pub mod access_evaluator;
pub mod access_manager;
pub mod access_state;
pub mod policy_script;
pub mod policy_store;
pub mod principal_directory;
pub mod types;

pub use access_evaluator::{AccessEvaluator, AccessRequest};
pub use access_manager::AccessManager;
pub use access_state::{AccessSnapshot, AccessState};
pub use policy_script::PolicyScript;
pub use policy_store::PolicyStore;
pub use principal_directory::{Identity, PrincipalDirectory, Role};
pub use types::{
    Action, ColumnPermissionResult, Decision, Effect, PolicyConflictAudit, PolicyFact,
    SecurablePath, Specificity,
};
