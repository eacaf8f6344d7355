use super::core::DbOperations;
use super::error_utils::ErrorUtils;
use crate::error::{AccessError, AccessResult};
use crate::permissions::access_state::AccessSnapshot;
use crate::permissions::principal_directory::{Identity, Role};
use crate::permissions::types::PolicyFact;
use crate::{log_database_debug, log_database_error};
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::collections::HashMap;

/// Writes and deletions for one tree, serialized ahead of the transaction.
#[derive(Debug, Default)]
struct TreeChanges {
    puts: Vec<(String, Vec<u8>)>,
    removes: Vec<String>,
}

impl TreeChanges {
    fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.removes.is_empty()
    }
}

/// Key under which a fact is stored.
pub fn fact_key(fact: &PolicyFact) -> String {
    format!("{:020}", fact.sequence)
}

fn diff_records<T, K>(before: &[T], after: &[T], key: K) -> AccessResult<TreeChanges>
where
    T: PartialEq + Serialize,
    K: Fn(&T) -> String,
{
    let old: HashMap<String, &T> = before.iter().map(|r| (key(r), r)).collect();
    let new: HashMap<String, &T> = after.iter().map(|r| (key(r), r)).collect();

    let mut changes = TreeChanges::default();
    for (k, record) in &new {
        if old.get(k) != Some(record) {
            let bytes =
                serde_json::to_vec(record).map_err(ErrorUtils::from_serialization_error(k))?;
            changes.puts.push((k.clone(), bytes));
        }
    }
    for k in old.keys() {
        if !new.contains_key(k) {
            changes.removes.push(k.clone());
        }
    }
    Ok(changes)
}

impl DbOperations {
    /// Reads every identity, role and fact.
    pub fn load_snapshot(&self) -> AccessResult<AccessSnapshot> {
        let identities: Vec<(String, Identity)> = self.list_items_in_tree(&self.identities_tree)?;
        let roles: Vec<(String, Role)> = self.list_items_in_tree(&self.roles_tree)?;
        let facts: Vec<(String, PolicyFact)> = self.list_items_in_tree(&self.policy_facts_tree)?;
        log_database_debug!(
            "Loaded {} identities, {} roles, {} facts",
            identities.len(),
            roles.len(),
            facts.len()
        );
        Ok(AccessSnapshot {
            identities: identities.into_iter().map(|(_, v)| v).collect(),
            roles: roles.into_iter().map(|(_, v)| v).collect(),
            facts: facts.into_iter().map(|(_, v)| v).collect(),
        })
    }

    /// Persists the difference between two snapshots in a single sled
    /// transaction, so a crash never leaves half of a mutation on disk.
    ///
    /// Returns an error only when the transaction itself fails. Once it has
    /// committed the change is part of the database, so a failing flush is
    /// logged and the change is reported as written; sled flushes it with
    /// the next successful flush.
    pub fn write_changes(&self, before: &AccessSnapshot, after: &AccessSnapshot) -> AccessResult<()> {
        let identities = diff_records(&before.identities, &after.identities, |i: &Identity| i.name.clone())?;
        let roles = diff_records(&before.roles, &after.roles, |r: &Role| r.name.clone())?;
        let facts = diff_records(&before.facts, &after.facts, fact_key)?;

        if identities.is_empty() && roles.is_empty() && facts.is_empty() {
            return Ok(());
        }

        let result: Result<(), TransactionError<String>> =
            (&self.identities_tree, &self.roles_tree, &self.policy_facts_tree).transaction(
                |(identities_tx, roles_tx, facts_tx)| {
                    for (tx, changes) in [
                        (identities_tx, &identities),
                        (roles_tx, &roles),
                        (facts_tx, &facts),
                    ] {
                        for key in &changes.removes {
                            tx.remove(key.as_bytes())?;
                        }
                        for (key, bytes) in &changes.puts {
                            tx.insert(key.as_bytes(), bytes.as_slice())?;
                        }
                    }
                    Ok::<(), ConflictableTransactionError<String>>(())
                },
            );

        result.map_err(|e| {
            log_database_error!("Failed to persist access changes: {}", e);
            AccessError::Database(format!("Transaction failed: {}", e))
        })?;

        if let Err(e) = self.db().flush() {
            log_database_error!("Access changes committed but not flushed: {}", e);
        }
        Ok(())
    }

    /// Makes the stored data equal to `snapshot`.
    pub fn replace_snapshot(&self, snapshot: &AccessSnapshot) -> AccessResult<()> {
        let current = self.load_snapshot()?;
        self.write_changes(&current, snapshot)
    }

    pub fn get_identity(&self, name: &str) -> AccessResult<Option<Identity>> {
        self.get_from_tree(&self.identities_tree, name)
    }

    pub fn get_role(&self, name: &str) -> AccessResult<Option<Role>> {
        self.get_from_tree(&self.roles_tree, name)
    }

    pub fn list_facts(&self) -> AccessResult<Vec<PolicyFact>> {
        let facts: Vec<(String, PolicyFact)> = self.list_items_in_tree(&self.policy_facts_tree)?;
        Ok(facts.into_iter().map(|(_, f)| f).collect())
    }
}
