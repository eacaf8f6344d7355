//! Declarative provisioning scripts.
//!
//! A script lists identities, roles, memberships and GRANT/DENY/REVOKE
//! statements in JSON and is applied as one mutation:
//!
//! ```json
//! {
//!   "identities": ["HRManagerUser"],
//!   "roles": ["HRRole"],
//!   "memberships": [{ "identity": "HRManagerUser", "role": "HRRole" }],
//!   "permissions": [
//!     { "principal": "HRRole", "effect": "ALLOW",
//!       "actions": ["SELECT", "INSERT", "UPDATE", "DELETE"], "securable": "GA1" }
//!   ]
//! }
//! ```

use crate::error::{AccessError, AccessResult};
use crate::permissions::access_state::AccessState;
use crate::permissions::types::{Action, Effect, SecurablePath};
use crate::{log_directory_debug, log_policy_info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub identity: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub principal: String,
    pub effect: Effect,
    pub actions: Vec<Action>,
    pub securable: SecurablePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    pub principal: String,
    pub actions: Vec<Action>,
    pub securable: SecurablePath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyScript {
    pub identities: Vec<String>,
    pub roles: Vec<String>,
    pub memberships: Vec<MembershipEntry>,
    pub permissions: Vec<PermissionEntry>,
    pub revocations: Vec<RevocationEntry>,
}

impl PolicyScript {
    pub fn from_json(json: &str) -> AccessResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AccessError::InvalidRequest(format!("Invalid policy script: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> AccessResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Applies the script in order: identities, roles, memberships,
    /// permissions, revocations. Principals that already exist with the same
    /// kind are kept, so re-running a script does not fail on them; permission
    /// entries are recorded again, like repeated GRANT statements.
    ///
    /// Returns the number of changes made. On error the caller discards
    /// `state`.
    pub fn apply_to(&self, state: &mut AccessState) -> AccessResult<usize> {
        let mut changes = 0;

        for name in &self.identities {
            if state.directory.contains_identity(name) {
                log_directory_debug!("Identity {} already exists", name);
            } else {
                state.directory.create_identity(name)?;
                changes += 1;
            }
        }

        for name in &self.roles {
            if state.directory.contains_role(name) {
                log_directory_debug!("Role {} already exists", name);
            } else {
                state.directory.create_role(name)?;
                changes += 1;
            }
        }

        for membership in &self.memberships {
            if state
                .directory
                .add_membership(&membership.identity, &membership.role)?
            {
                changes += 1;
            }
        }

        for entry in &self.permissions {
            if entry.actions.is_empty() {
                return Err(AccessError::InvalidRequest(format!(
                    "permission entry for {} on {} lists no actions",
                    entry.principal, entry.securable
                )));
            }
            if !state.directory.contains_principal(&entry.principal) {
                return Err(AccessError::UnknownPrincipal(entry.principal.clone()));
            }
            for action in &entry.actions {
                state.policies.grant(
                    &entry.principal,
                    *action,
                    entry.securable.clone(),
                    entry.effect,
                );
                changes += 1;
            }
        }

        for entry in &self.revocations {
            for action in &entry.actions {
                changes += state
                    .policies
                    .revoke(&entry.principal, *action, &entry.securable)
                    .len();
            }
        }

        log_policy_info!("Policy script applied {} change(s)", changes);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "identities": ["HRManagerUser", "SalesRepUser"],
        "roles": ["HRRole", "SalesRole"],
        "memberships": [
            { "identity": "HRManagerUser", "role": "HRRole" },
            { "identity": "SalesRepUser", "role": "SalesRole" }
        ],
        "permissions": [
            { "principal": "HRRole", "effect": "GRANT",
              "actions": ["SELECT", "INSERT", "UPDATE", "DELETE"], "securable": "GA1" },
            { "principal": "SalesRole", "effect": "ALLOW",
              "actions": ["SELECT"], "securable": "GA1.EmployeeData" },
            { "principal": "SalesRole", "effect": "DENY",
              "actions": ["SELECT"], "securable": "GA1.EmployeeData.Salary" }
        ]
    }"#;

    #[test]
    fn applies_every_section() {
        let script = PolicyScript::from_json(SCRIPT).unwrap();
        let mut state = AccessState::default();
        let changes = script.apply_to(&mut state).unwrap();
        assert_eq!(changes, 2 + 2 + 2 + 6);
        assert_eq!(state.policies.len(), 6);

        let salary: SecurablePath = "GA1.EmployeeData.Salary".parse().unwrap();
        assert!(state.evaluate("HRManagerUser", Action::Read, &salary).unwrap().is_allowed());
        assert!(!state.evaluate("SalesRepUser", Action::Read, &salary).unwrap().is_allowed());
    }

    #[test]
    fn reapplying_keeps_principals() {
        let script = PolicyScript::from_json(SCRIPT).unwrap();
        let mut state = AccessState::default();
        script.apply_to(&mut state).unwrap();
        let changes = script.apply_to(&mut state).unwrap();
        assert_eq!(changes, 6);
        assert_eq!(state.policies.len(), 12);
    }

    #[test]
    fn revocations_remove_facts() {
        let mut script = PolicyScript::from_json(SCRIPT).unwrap();
        script.revocations.push(RevocationEntry {
            principal: "SalesRole".to_string(),
            actions: vec![Action::Read],
            securable: "GA1.EmployeeData.Salary".parse().unwrap(),
        });
        let mut state = AccessState::default();
        script.apply_to(&mut state).unwrap();
        assert_eq!(state.policies.len(), 5);
    }

    #[test]
    fn malformed_scripts_are_invalid_requests() {
        let bad_path = r#"{ "roles": ["R"], "permissions": [
            { "principal": "R", "effect": "ALLOW", "actions": ["SELECT"], "securable": "GA1..x" }
        ] }"#;
        assert!(matches!(
            PolicyScript::from_json(bad_path),
            Err(AccessError::InvalidRequest(_))
        ));

        let bad_action = r#"{ "permissions": [
            { "principal": "R", "effect": "ALLOW", "actions": ["EXECUTE"], "securable": "GA1" }
        ] }"#;
        assert!(PolicyScript::from_json(bad_action).is_err());
    }

    #[test]
    fn unknown_principal_fails() {
        let script = PolicyScript::from_json(
            r#"{ "permissions": [
                { "principal": "Ghost", "effect": "DENY", "actions": ["DELETE"], "securable": "GA1" }
            ] }"#,
        )
        .unwrap();
        let mut state = AccessState::default();
        assert!(matches!(
            script.apply_to(&mut state),
            Err(AccessError::UnknownPrincipal(_))
        ));
    }
}
