pub mod action;
pub mod decision;
pub mod policy;
pub mod securable;

pub use action::Action;
pub use decision::{ColumnPermissionResult, Decision, PolicyConflictAudit};
pub use policy::{Effect, PolicyFact};
pub use securable::{SecurablePath, Specificity};
