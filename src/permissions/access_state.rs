use crate::error::{AccessError, AccessResult};
use crate::permissions::access_evaluator::{AccessEvaluator, AccessRequest};
use crate::permissions::policy_store::PolicyStore;
use crate::permissions::principal_directory::{Identity, PrincipalDirectory, Role};
use crate::permissions::types::{Action, Decision, PolicyFact, SecurablePath};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serializable copy of every identity, role and fact.
///
/// This is the unit exchanged with persistence: a full, consistent snapshot
/// is loaded at startup and written back on import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSnapshot {
    pub identities: Vec<Identity>,
    pub roles: Vec<Role>,
    pub facts: Vec<PolicyFact>,
}

impl AccessSnapshot {
    /// Rejects snapshots that could not be stored faithfully: repeated
    /// principal names (identities and roles share one namespace) and
    /// repeated fact sequences or ids.
    pub fn validate(&self) -> AccessResult<()> {
        let mut names = HashSet::new();
        let principals = self
            .identities
            .iter()
            .map(|i| &i.name)
            .chain(self.roles.iter().map(|r| &r.name));
        for name in principals {
            if !names.insert(name.as_str()) {
                return Err(AccessError::InvalidRequest(format!(
                    "Principal name '{}' appears more than once in snapshot",
                    name
                )));
            }
        }

        let mut sequences = HashSet::new();
        let mut ids = HashSet::new();
        for fact in &self.facts {
            if !sequences.insert(fact.sequence) {
                return Err(AccessError::InvalidRequest(format!(
                    "Fact sequence {} appears more than once in snapshot",
                    fact.sequence
                )));
            }
            if !ids.insert(fact.id) {
                return Err(AccessError::InvalidRequest(format!(
                    "Fact id {} appears more than once in snapshot",
                    fact.id
                )));
            }
        }
        Ok(())
    }
}

/// One consistent version of the directory and the policy store.
#[derive(Debug, Clone, Default)]
pub struct AccessState {
    pub directory: PrincipalDirectory,
    pub policies: PolicyStore,
}

impl AccessState {
    pub fn from_snapshot(snapshot: AccessSnapshot) -> Self {
        let directory = PrincipalDirectory::from_records(snapshot.identities, snapshot.roles);
        let facts = snapshot
            .facts
            .into_iter()
            .filter(|f| directory.contains_principal(&f.principal))
            .collect();
        Self {
            directory,
            policies: PolicyStore::from_facts(facts),
        }
    }

    pub fn to_snapshot(&self) -> AccessSnapshot {
        AccessSnapshot {
            identities: self.directory.list_identities().cloned().collect(),
            roles: self.directory.list_roles().cloned().collect(),
            facts: self.policies.facts().to_vec(),
        }
    }

    pub fn evaluator(&self) -> AccessEvaluator<'_> {
        AccessEvaluator::new(&self.directory, &self.policies)
    }

    pub fn evaluate(
        &self,
        identity: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> AccessResult<Decision> {
        self.evaluator().evaluate(identity, action, securable)
    }

    pub fn evaluate_request(&self, request: &AccessRequest) -> AccessResult<Decision> {
        self.evaluator().evaluate_request(request)
    }
}
