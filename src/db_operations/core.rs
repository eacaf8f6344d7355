use super::error_utils::ErrorUtils;
use crate::error::{AccessError, AccessResult};
use crate::log_database_info;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::Path;

const FORMAT_VERSION_KEY: &str = "format_version";
const FORMAT_VERSION: u32 = 1;

/// Persistence for identities, roles and policy facts on top of sled.
///
/// Each record kind lives in its own tree and is stored as JSON. Every write
/// is flushed before returning.
#[derive(Clone)]
pub struct DbOperations {
    /// The underlying sled database instance
    db: sled::Db,
    pub(crate) metadata_tree: sled::Tree,
    pub(crate) identities_tree: sled::Tree,
    pub(crate) roles_tree: sled::Tree,
    /// Facts keyed by zero-padded sequence so iteration follows recording order
    pub(crate) policy_facts_tree: sled::Tree,
}

impl DbOperations {
    /// Wraps an open sled database, creating the trees on first use
    pub fn new(db: sled::Db) -> AccessResult<Self> {
        let metadata_tree = db
            .open_tree("metadata")
            .map_err(|e| ErrorUtils::tree_error("open", "metadata", e))?;
        let identities_tree = db
            .open_tree("identities")
            .map_err(|e| ErrorUtils::tree_error("open", "identities", e))?;
        let roles_tree = db
            .open_tree("roles")
            .map_err(|e| ErrorUtils::tree_error("open", "roles", e))?;
        let policy_facts_tree = db
            .open_tree("policy_facts")
            .map_err(|e| ErrorUtils::tree_error("open", "policy_facts", e))?;

        let ops = Self {
            db,
            metadata_tree,
            identities_tree,
            roles_tree,
            policy_facts_tree,
        };
        ops.check_format_version()?;
        Ok(ops)
    }

    /// Stamps a new database with the current format version and rejects
    /// databases written in another format
    fn check_format_version(&self) -> AccessResult<()> {
        match self.get_from_tree::<u32>(&self.metadata_tree, FORMAT_VERSION_KEY)? {
            None => self.store_in_tree(&self.metadata_tree, FORMAT_VERSION_KEY, &FORMAT_VERSION),
            Some(version) if version == FORMAT_VERSION => Ok(()),
            Some(version) => Err(AccessError::Database(format!(
                "Unsupported storage format version {} (expected {})",
                version, FORMAT_VERSION
            ))),
        }
    }

    /// Storage format version recorded in the metadata tree
    pub fn format_version(&self) -> AccessResult<Option<u32>> {
        self.get_from_tree(&self.metadata_tree, FORMAT_VERSION_KEY)
    }

    /// Opens (or creates) a database directory
    pub fn open<P: AsRef<Path>>(path: P) -> AccessResult<Self> {
        log_database_info!("Opening access database at {}", path.as_ref().display());
        let db = sled::open(path.as_ref()).map_err(ErrorUtils::from_sled_error("open"))?;
        Self::new(db)
    }

    /// Opens a database that is deleted when dropped
    pub fn temporary() -> AccessResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(ErrorUtils::from_sled_error("open temporary"))?;
        Self::new(db)
    }

    /// Gets a reference to the underlying database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Counts the records in each tree
    pub fn get_stats(&self) -> HashMap<String, u64> {
        let mut stats = HashMap::new();
        stats.insert("identities".to_string(), self.identities_tree.len() as u64);
        stats.insert("roles".to_string(), self.roles_tree.len() as u64);
        stats.insert(
            "policy_facts".to_string(),
            self.policy_facts_tree.len() as u64,
        );
        stats.insert("metadata".to_string(), self.metadata_tree.len() as u64);
        stats
    }

    // ========== GENERIC TREE OPERATIONS ==========

    /// Stores any serializable item in a specific tree
    pub fn store_in_tree<T: Serialize>(
        &self,
        tree: &sled::Tree,
        key: &str,
        item: &T,
    ) -> AccessResult<()> {
        let bytes = serde_json::to_vec(item).map_err(ErrorUtils::from_serialization_error(key))?;

        tree.insert(key.as_bytes(), bytes)
            .map_err(ErrorUtils::from_sled_error("insert"))?;

        tree.flush().map_err(ErrorUtils::from_sled_error("flush"))?;

        Ok(())
    }

    /// Retrieves any deserializable item from a specific tree
    pub fn get_from_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
        key: &str,
    ) -> AccessResult<Option<T>> {
        match tree
            .get(key.as_bytes())
            .map_err(ErrorUtils::from_sled_error("get"))?
        {
            Some(bytes) => {
                let item = serde_json::from_slice(&bytes)
                    .map_err(ErrorUtils::from_deserialization_error(key))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Lists every item in a tree, in key order
    pub fn list_items_in_tree<T: DeserializeOwned>(
        &self,
        tree: &sled::Tree,
    ) -> AccessResult<Vec<(String, T)>> {
        let mut items = Vec::new();
        for result in tree.iter() {
            let (key, value) = result.map_err(ErrorUtils::from_sled_error("iterate"))?;
            let key_str = String::from_utf8_lossy(&key).to_string();
            let item: T = serde_json::from_slice(&value)
                .map_err(ErrorUtils::from_deserialization_error(&key_str))?;
            items.push((key_str, item));
        }
        Ok(items)
    }
}
