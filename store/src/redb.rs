//! Redb-backed persistent identity store.
//!
//! One table, one JSON document per identity. Every mutation runs inside a
//! single write transaction, which gives the per-document atomicity the
//! rest of the system relies on.

use std::path::Path;

use ::redb::{Database, ReadableTable, TableDefinition};

use crate::error::StoreError;
use crate::model::{Identity, normalize_id};
use crate::store::{IdentityFilter, IdentityStore};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

/// A persistent identity store backed by redb.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::Storage(e.to_string()))?;

        // Create the table if it doesn't exist
        let tx = db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let _ = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self { db })
    }
}

fn decode(bytes: &[u8]) -> Result<Identity, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode(identity: &Identity) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(identity).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl IdentityStore for RedbStore {
    fn get(&self, identity_id: &str) -> Result<Option<Identity>, StoreError> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        match table
            .get(normalize_id(identity_id).as_str())
            .map_err(|e| StoreError::Storage(e.to_string()))?
        {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn upsert(&self, identity: &Identity) -> Result<(), StoreError> {
        let bytes = encode(identity)?;
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .insert(identity.identity_id.as_str(), bytes.as_slice())
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    fn find(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut matched = Vec::new();
        for item in table.iter().map_err(|e| StoreError::Storage(e.to_string()))? {
            let (_, value) = item.map_err(|e| StoreError::Storage(e.to_string()))?;
            let identity = decode(value.value())?;
            if filter.matches(&identity) {
                matched.push(identity);
            }
        }

        matched.sort_by(|a, b| a.identity_id.cmp(&b.identity_id));
        Ok(matched)
    }

    fn increment_counter(
        &self,
        identity_id: &str,
        field: &str,
        delta: u64,
    ) -> Result<u64, StoreError> {
        let key = normalize_id(identity_id);
        let tx = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let value = {
            let mut table = tx
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;

            let mut identity = {
                let existing = table
                    .get(key.as_str())
                    .map_err(|e| StoreError::Storage(e.to_string()))?
                    .ok_or_else(|| StoreError::NotFound(key.clone()))?;
                decode(existing.value())?
            };

            let counter = identity.counters.entry(field.to_string()).or_insert(0);
            *counter += delta;
            let value = *counter;
            identity.updated_at = chrono::Utc::now();

            let bytes = encode(&identity)?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            value
        };
        tx.commit().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = tx
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut ids = Vec::new();
        for item in table.iter().map_err(|e| StoreError::Storage(e.to_string()))? {
            let (key, _) = item.map_err(|e| StoreError::Storage(e.to_string()))?;
            ids.push(key.value().to_string());
        }
        ids.sort();
        Ok(ids)
    }
}
