use crate::error::StoreError;
use crate::model::{FaceStatus, Identity};

/// Counter key every confirmation bumps alongside the per-kind key.
pub const TOTAL_COUNTER: &str = "total";

/// Selection criteria for [`IdentityStore::find`]. Empty filter matches all.
#[derive(Debug, Clone, Default)]
pub struct IdentityFilter {
    pub status: Option<FaceStatus>,
    /// Match identities whose group path starts with these segments.
    pub group_prefix: Option<Vec<String>>,
    pub has_vector: Option<bool>,
}

impl IdentityFilter {
    pub fn with_status(status: FaceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        if let Some(status) = self.status {
            if identity.status != status {
                return false;
            }
        }
        if let Some(ref prefix) = self.group_prefix {
            if identity.group_path.len() < prefix.len()
                || identity.group_path[..prefix.len()] != prefix[..]
            {
                return false;
            }
        }
        if let Some(has_vector) = self.has_vector {
            if identity.vector.is_some() != has_vector {
                return false;
            }
        }
        true
    }
}

/// IdentityStore is the interface to the identity document collection.
///
/// Each document is keyed by the normalized identity id; `upsert` replaces
/// the whole document atomically, and `increment_counter` is an atomic
/// read-modify-write on one counter field. Implementations must be safe
/// for concurrent use (Send + Sync) and must return listings sorted by
/// identity id.
pub trait IdentityStore: Send + Sync {
    /// Fetch one identity by id.
    fn get(&self, identity_id: &str) -> Result<Option<Identity>, StoreError>;

    /// Insert or replace one identity document atomically.
    fn upsert(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Return all identities matching the filter, sorted by id.
    fn find(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, StoreError>;

    /// Atomically add `delta` to one counter field and return its new value.
    /// Errors with [`StoreError::NotFound`] for unknown identities.
    fn increment_counter(
        &self,
        identity_id: &str,
        field: &str,
        delta: u64,
    ) -> Result<u64, StoreError>;

    /// Return all known identity ids, sorted.
    fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}
