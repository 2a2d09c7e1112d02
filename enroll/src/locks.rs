use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-identity mutation locks. Concurrent enrollments of the same
/// identity serialize on its slot; different identities proceed in
/// parallel.
pub(crate) struct IdLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Return the lock slot for one identity, creating it on first use.
    pub fn acquire(&self, identity_id: &str) -> Arc<Mutex<()>> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner
            .entry(identity_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_same_slot() {
        let locks = IdLocks::new();
        let a = locks.acquire("S1");
        let b = locks.acquire("S1");
        let c = locks.acquire("S2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
