use std::sync::{Arc, RwLock};

use tracing::warn;

use faceguard_store::{FaceStatus, IdentityFilter, IdentityStore};

use crate::error::MatchError;

/// One active identity inside a snapshot.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub identity_id: String,
    pub group_path: Vec<String>,
    pub vector: Vec<f32>,
}

/// Immutable point-in-time view of the searchable population.
/// Entries are sorted by identity id, which fixes the iteration order
/// queries (and therefore tie-breaks) see.
pub struct IndexSnapshot {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuildable in-memory set of all active identity vectors. Not
/// authoritative storage: it can be rebuilt from the document store at any
/// time.
///
/// Readers take an `Arc` to the current snapshot and never block writers;
/// a rebuild swaps in a whole new snapshot, so in-flight queries finish
/// against the version they started with.
pub struct IdentityIndex {
    dimension: usize,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl IdentityIndex {
    /// Create an empty index for vectors of the given dimension.
    /// Panics if `dimension` is 0.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "matcher: index dimension must be positive");
        Self {
            dimension,
            snapshot: RwLock::new(Arc::new(IndexSnapshot {
                dimension,
                entries: Vec::new(),
            })),
        }
    }

    /// Reload every active identity from the store and atomically swap the
    /// snapshot. Returns the number of indexed identities.
    pub fn rebuild(&self, store: &dyn IdentityStore) -> Result<usize, MatchError> {
        let filter = IdentityFilter {
            status: Some(FaceStatus::Active),
            has_vector: Some(true),
            ..IdentityFilter::default()
        };

        let mut entries = Vec::new();
        for identity in store.find(&filter)? {
            let Some(vector) = identity.vector else {
                continue;
            };
            if vector.len() != self.dimension {
                warn!(
                    "index: {} has a {}-dim vector, want {}; left out",
                    identity.identity_id,
                    vector.len(),
                    self.dimension
                );
                continue;
            }
            entries.push(IndexEntry {
                identity_id: identity.identity_id,
                group_path: identity.group_path,
                vector,
            });
        }

        let count = entries.len();
        let snapshot = Arc::new(IndexSnapshot {
            dimension: self.dimension,
            entries,
        });
        *self.snapshot.write().expect("lock poisoned") = snapshot;
        Ok(count)
    }

    /// The current snapshot. Cheap; just an Arc clone.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().expect("lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
