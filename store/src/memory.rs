use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::model::{Identity, normalize_id};
use crate::store::{IdentityFilter, IdentityStore};

/// In-memory [`IdentityStore`] backed by a HashMap.
/// Data is lost on restart. Suitable for testing or ephemeral use.
pub struct MemoryStore {
    identities: Mutex<HashMap<String, Identity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for MemoryStore {
    fn get(&self, identity_id: &str) -> Result<Option<Identity>, StoreError> {
        let identities = self.identities.lock().expect("lock poisoned");
        Ok(identities.get(&normalize_id(identity_id)).cloned())
    }

    fn upsert(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut identities = self.identities.lock().expect("lock poisoned");
        identities.insert(identity.identity_id.clone(), identity.clone());
        Ok(())
    }

    fn find(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError> {
        let identities = self.identities.lock().expect("lock poisoned");
        let mut matched: Vec<Identity> = identities
            .values()
            .filter(|identity| filter.matches(identity))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.identity_id.cmp(&b.identity_id));
        Ok(matched)
    }

    fn increment_counter(
        &self,
        identity_id: &str,
        field: &str,
        delta: u64,
    ) -> Result<u64, StoreError> {
        let mut identities = self.identities.lock().expect("lock poisoned");
        let key = normalize_id(identity_id);
        let identity = identities
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        let counter = identity.counters.entry(field.to_string()).or_insert(0);
        *counter += delta;
        let value = *counter;
        identity.updated_at = chrono::Utc::now();
        Ok(value)
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let identities = self.identities.lock().expect("lock poisoned");
        let mut ids: Vec<String> = identities.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
