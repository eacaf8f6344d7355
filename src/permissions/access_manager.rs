use crate::config::AccessConfig;
use crate::db_operations::DbOperations;
use crate::error::{AccessError, AccessResult};
use crate::permissions::access_evaluator::AccessRequest;
use crate::permissions::access_state::{AccessSnapshot, AccessState};
use crate::permissions::policy_script::PolicyScript;
use crate::permissions::types::{
    Action, ColumnPermissionResult, Decision, Effect, PolicyFact, SecurablePath,
};
use crate::{log_directory_info, log_policy_info};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

/// Thread-safe entry point to the access control core.
///
/// Readers work on an immutable [`AccessState`] snapshot: `evaluate` clones
/// the current `Arc` and never holds a lock while deciding. Writers are
/// serialized by `write_lock`; each one mutates a private copy, persists the
/// difference and only then publishes the copy. A failed mutation leaves the
/// published snapshot untouched.
pub struct AccessManager {
    state: RwLock<Arc<AccessState>>,
    write_lock: Mutex<()>,
    db: Option<DbOperations>,
}

impl AccessManager {
    /// Creates a manager with no persistence
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Arc::new(AccessState::default())),
            write_lock: Mutex::new(()),
            db: None,
        }
    }

    /// Creates a manager backed by `db`, loading its snapshot
    pub fn with_db(db: DbOperations) -> AccessResult<Self> {
        let snapshot = db.load_snapshot()?;
        let state = AccessState::from_snapshot(snapshot);
        log_directory_info!(
            "Loaded {} identities, {} roles and {} facts",
            state.directory.list_identities().count(),
            state.directory.list_roles().count(),
            state.policies.len()
        );
        Ok(Self {
            state: RwLock::new(Arc::new(state)),
            write_lock: Mutex::new(()),
            db: Some(db),
        })
    }

    /// Opens the configured database, or stays in memory when no storage path
    /// is configured
    pub fn open(config: &AccessConfig) -> AccessResult<Self> {
        match &config.storage_path {
            Some(path) => Self::with_db(DbOperations::open(path)?),
            None => Ok(Self::in_memory()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.db.is_some()
    }

    /// The current consistent snapshot
    pub fn snapshot(&self) -> AccessResult<Arc<AccessState>> {
        let guard = self
            .state
            .read()
            .map_err(|_| AccessError::LockPoisoned("access state".to_string()))?;
        Ok(Arc::clone(&guard))
    }

    pub fn export_snapshot(&self) -> AccessResult<AccessSnapshot> {
        Ok(self.snapshot()?.to_snapshot())
    }

    // ========== READS ==========

    pub fn evaluate(
        &self,
        identity: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> AccessResult<Decision> {
        self.snapshot()?.evaluate(identity, action, securable)
    }

    pub fn evaluate_request(&self, request: &AccessRequest) -> AccessResult<Decision> {
        self.snapshot()?.evaluate_request(request)
    }

    pub fn check_columns(
        &self,
        identity: &str,
        action: Action,
        object: &SecurablePath,
        columns: &[String],
    ) -> AccessResult<Vec<ColumnPermissionResult>> {
        self.snapshot()?
            .evaluator()
            .check_columns(identity, action, object, columns)
    }

    pub fn resolve_effective_roles(&self, identity: &str) -> AccessResult<BTreeSet<String>> {
        self.snapshot()?.directory.resolve_effective_roles(identity)
    }

    // ========== MUTATIONS ==========

    pub fn create_identity(&self, name: &str) -> AccessResult<()> {
        self.mutate(|state| state.directory.create_identity(name).map(|_| ()))
    }

    /// Drops an identity together with every fact granted directly to it
    pub fn drop_identity(&self, name: &str) -> AccessResult<()> {
        self.mutate(|state| {
            state.directory.drop_identity(name)?;
            let removed = state.policies.remove_principal(name);
            log_policy_info!("Removed {} fact(s) held by {}", removed, name);
            Ok(())
        })
    }

    pub fn create_role(&self, name: &str) -> AccessResult<()> {
        self.mutate(|state| state.directory.create_role(name).map(|_| ()))
    }

    /// Drops a role, its memberships, and every fact granted to it
    pub fn drop_role(&self, name: &str) -> AccessResult<()> {
        self.mutate(|state| {
            state.directory.drop_role(name)?;
            let removed = state.policies.remove_principal(name);
            log_policy_info!("Removed {} fact(s) held by {}", removed, name);
            Ok(())
        })
    }

    /// Returns `false` when the membership already existed
    pub fn add_membership(&self, identity: &str, role: &str) -> AccessResult<bool> {
        self.mutate(|state| state.directory.add_membership(identity, role))
    }

    /// Returns `false` when the identity was not a member
    pub fn remove_membership(&self, identity: &str, role: &str) -> AccessResult<bool> {
        self.mutate(|state| state.directory.remove_membership(identity, role))
    }

    /// Records an ALLOW fact
    pub fn grant(
        &self,
        principal: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> AccessResult<PolicyFact> {
        self.record(principal, action, securable, Effect::Allow)
    }

    /// Records a DENY fact
    pub fn deny(
        &self,
        principal: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> AccessResult<PolicyFact> {
        self.record(principal, action, securable, Effect::Deny)
    }

    /// Records one fact per action, atomically
    pub fn record_all(
        &self,
        principal: &str,
        actions: &[Action],
        securable: &SecurablePath,
        effect: Effect,
    ) -> AccessResult<Vec<PolicyFact>> {
        self.mutate(|state| {
            ensure_principal(state, principal)?;
            Ok(actions
                .iter()
                .map(|action| {
                    state
                        .policies
                        .grant(principal, *action, securable.clone(), effect)
                })
                .collect())
        })
    }

    /// Removes every matching fact regardless of effect. Returns the number
    /// removed; zero is not an error.
    pub fn revoke(
        &self,
        principal: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> AccessResult<usize> {
        self.mutate(|state| {
            ensure_principal(state, principal)?;
            Ok(state.policies.revoke(principal, action, securable).len())
        })
    }

    /// Replaces the whole state with `snapshot`. Snapshots with repeated
    /// principal names, fact sequences or fact ids are rejected.
    pub fn import_snapshot(&self, snapshot: AccessSnapshot) -> AccessResult<()> {
        snapshot.validate()?;
        self.mutate(|state| {
            *state = AccessState::from_snapshot(snapshot);
            Ok(())
        })
    }

    /// Applies every step of `script` or none of them
    pub fn apply_script(&self, script: &PolicyScript) -> AccessResult<usize> {
        self.mutate(|state| script.apply_to(state))
    }

    fn record(
        &self,
        principal: &str,
        action: Action,
        securable: &SecurablePath,
        effect: Effect,
    ) -> AccessResult<PolicyFact> {
        self.mutate(|state| {
            ensure_principal(state, principal)?;
            Ok(state
                .policies
                .grant(principal, action, securable.clone(), effect))
        })
    }

    /// Runs `f` against a private copy of the state, persists the result and
    /// publishes it. Writers are serialized; readers keep seeing the previous
    /// snapshot until the swap.
    fn mutate<T, F>(&self, f: F) -> AccessResult<T>
    where
        F: FnOnce(&mut AccessState) -> AccessResult<T>,
    {
        let _writer = self
            .write_lock
            .lock()
            .map_err(|_| AccessError::LockPoisoned("writer".to_string()))?;

        let current = self.snapshot()?;
        let mut next = (*current).clone();
        let output = f(&mut next)?;

        if let Some(db) = &self.db {
            db.write_changes(&current.to_snapshot(), &next.to_snapshot())?;
        }

        let mut guard = self
            .state
            .write()
            .map_err(|_| AccessError::LockPoisoned("access state".to_string()))?;
        *guard = Arc::new(next);
        Ok(output)
    }
}

fn ensure_principal(state: &AccessState, principal: &str) -> AccessResult<()> {
    if state.directory.contains_principal(principal) {
        Ok(())
    } else {
        Err(AccessError::UnknownPrincipal(principal.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> SecurablePath {
        s.parse().unwrap()
    }

    #[test]
    fn failed_mutation_leaves_state_untouched() {
        let manager = AccessManager::in_memory();
        manager.create_role("HRRole").unwrap();
        let before = manager.snapshot().unwrap();

        let err = manager.add_membership("Ghost", "HRRole").unwrap_err();
        assert!(matches!(err, AccessError::UnknownIdentity(_)));
        assert!(Arc::ptr_eq(&before, &manager.snapshot().unwrap()));
    }

    #[test]
    fn grant_requires_known_principal() {
        let manager = AccessManager::in_memory();
        assert!(matches!(
            manager.grant("Nobody", Action::Read, &path("GA1")),
            Err(AccessError::UnknownPrincipal(_))
        ));
        assert!(matches!(
            manager.revoke("Nobody", Action::Read, &path("GA1")),
            Err(AccessError::UnknownPrincipal(_))
        ));
    }

    #[test]
    fn snapshots_are_immutable() {
        let manager = AccessManager::in_memory();
        manager.create_identity("HRManagerUser").unwrap();
        manager.create_role("HRRole").unwrap();
        manager.add_membership("HRManagerUser", "HRRole").unwrap();

        let old = manager.snapshot().unwrap();
        manager.grant("HRRole", Action::Read, &path("GA1")).unwrap();

        let target = path("GA1.EmployeeData");
        assert!(!old.evaluate("HRManagerUser", Action::Read, &target).unwrap().is_allowed());
        assert!(manager
            .evaluate("HRManagerUser", Action::Read, &target)
            .unwrap()
            .is_allowed());
    }

    #[test]
    fn dropping_a_principal_removes_its_facts() {
        let manager = AccessManager::in_memory();
        manager.create_identity("SalesRepUser").unwrap();
        manager.create_role("SalesRole").unwrap();
        manager.add_membership("SalesRepUser", "SalesRole").unwrap();
        manager
            .record_all("SalesRole", &Action::ALL, &path("GA1.EmployeeData"), Effect::Allow)
            .unwrap();
        manager.drop_role("SalesRole").unwrap();

        let snapshot = manager.snapshot().unwrap();
        assert!(snapshot.policies.is_empty());

        // a role recreated under the same name starts without permissions
        manager.create_role("SalesRole").unwrap();
        manager.add_membership("SalesRepUser", "SalesRole").unwrap();
        assert!(!manager
            .evaluate("SalesRepUser", Action::Read, &path("GA1.EmployeeData"))
            .unwrap()
            .is_allowed());
    }
}
