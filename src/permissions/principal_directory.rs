use crate::error::{AccessError, AccessResult};
use crate::{log_directory_debug, log_directory_info};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A named security principal that can log in and be granted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub roles: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

/// A named group of identities. Roles are flat: a role cannot be a member of
/// another role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Stores identities, roles and identity→role memberships.
///
/// Identities and roles share one namespace because policy facts name their
/// principal by string.
#[derive(Debug, Clone, Default)]
pub struct PrincipalDirectory {
    identities: BTreeMap<String, Identity>,
    roles: BTreeMap<String, Role>,
}

impl PrincipalDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a directory from persisted records.
    ///
    /// Memberships pointing at roles that are not in `roles` are dropped.
    pub fn from_records(identities: Vec<Identity>, roles: Vec<Role>) -> Self {
        let roles: BTreeMap<String, Role> =
            roles.into_iter().map(|r| (r.name.clone(), r)).collect();
        let identities = identities
            .into_iter()
            .map(|mut identity| {
                identity.roles.retain(|role| roles.contains_key(role));
                (identity.name.clone(), identity)
            })
            .collect();
        Self { identities, roles }
    }

    pub fn contains_principal(&self, name: &str) -> bool {
        self.identities.contains_key(name) || self.roles.contains_key(name)
    }

    pub fn contains_identity(&self, name: &str) -> bool {
        self.identities.contains_key(name)
    }

    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn create_identity(&mut self, name: &str) -> AccessResult<&Identity> {
        self.ensure_name_free(name)?;
        log_directory_info!("Creating identity {}", name);
        let identity = Identity {
            name: name.to_string(),
            roles: BTreeSet::new(),
            created_at: Utc::now(),
        };
        Ok(self.identities.entry(name.to_string()).or_insert(identity))
    }

    pub fn drop_identity(&mut self, name: &str) -> AccessResult<Identity> {
        let identity = self
            .identities
            .remove(name)
            .ok_or_else(|| AccessError::UnknownIdentity(name.to_string()))?;
        log_directory_info!("Dropped identity {}", name);
        Ok(identity)
    }

    pub fn create_role(&mut self, name: &str) -> AccessResult<&Role> {
        self.ensure_name_free(name)?;
        log_directory_info!("Creating role {}", name);
        let role = Role {
            name: name.to_string(),
            created_at: Utc::now(),
        };
        Ok(self.roles.entry(name.to_string()).or_insert(role))
    }

    /// Removes a role and every membership in it.
    pub fn drop_role(&mut self, name: &str) -> AccessResult<Role> {
        let role = self
            .roles
            .remove(name)
            .ok_or_else(|| AccessError::UnknownRole(name.to_string()))?;
        for identity in self.identities.values_mut() {
            identity.roles.remove(name);
        }
        log_directory_info!("Dropped role {}", name);
        Ok(role)
    }

    /// Direct role memberships of `identity`.
    pub fn resolve_effective_roles(&self, identity: &str) -> AccessResult<BTreeSet<String>> {
        self.identities
            .get(identity)
            .map(|i| i.roles.clone())
            .ok_or_else(|| AccessError::UnknownIdentity(identity.to_string()))
    }

    /// Adds `identity` to `role`. Returns `false` when the membership already
    /// existed; that is not an error.
    pub fn add_membership(&mut self, identity: &str, role: &str) -> AccessResult<bool> {
        if !self.roles.contains_key(role) {
            return Err(AccessError::UnknownRole(role.to_string()));
        }
        let entry = self
            .identities
            .get_mut(identity)
            .ok_or_else(|| AccessError::UnknownIdentity(identity.to_string()))?;
        let added = entry.roles.insert(role.to_string());
        if added {
            log_directory_info!("Added {} to role {}", identity, role);
        } else {
            log_directory_debug!("{} is already a member of {}", identity, role);
        }
        Ok(added)
    }

    /// Removes `identity` from `role`. Returns `false` when it was not a member.
    pub fn remove_membership(&mut self, identity: &str, role: &str) -> AccessResult<bool> {
        let entry = self
            .identities
            .get_mut(identity)
            .ok_or_else(|| AccessError::UnknownIdentity(identity.to_string()))?;
        let removed = entry.roles.remove(role);
        if removed {
            log_directory_info!("Removed {} from role {}", identity, role);
        }
        Ok(removed)
    }

    pub fn get_identity(&self, name: &str) -> Option<&Identity> {
        self.identities.get(name)
    }

    pub fn get_role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn list_identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    pub fn list_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn role_members(&self, role: &str) -> AccessResult<Vec<String>> {
        if !self.roles.contains_key(role) {
            return Err(AccessError::UnknownRole(role.to_string()));
        }
        Ok(self
            .identities
            .values()
            .filter(|i| i.roles.contains(role))
            .map(|i| i.name.clone())
            .collect())
    }

    fn ensure_name_free(&self, name: &str) -> AccessResult<()> {
        validate_principal_name(name)?;
        if self.contains_principal(name) {
            return Err(AccessError::DuplicatePrincipal(name.to_string()));
        }
        Ok(())
    }
}

/// Principal names must be non-empty and free of control characters.
pub fn validate_principal_name(name: &str) -> AccessResult<()> {
    if name.trim().is_empty() {
        return Err(AccessError::InvalidRequest(
            "principal name cannot be empty".to_string(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(AccessError::InvalidRequest(format!(
            "principal name {:?} contains control characters",
            name
        )));
    }
    Ok(())
}
