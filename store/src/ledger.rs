use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// One immutable violation record, appended by match confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub record_id: String,
    pub identity_id: String,

    /// Violation kind (e.g. "late_arrival"). Free-form; the counter key is
    /// derived from it.
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Caller-supplied deduplication key for one physical event. Passed
    /// through verbatim; the ledger's idempotency contract owns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,

    pub recorded_at: DateTime<Utc>,
}

impl Violation {
    pub fn new(
        identity_id: &str,
        kind: &str,
        location: Option<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            identity_id: identity_id.to_string(),
            kind: kind.to_string(),
            location,
            idempotency_key,
            recorded_at: Utc::now(),
        }
    }
}

/// ViolationLedger is the append-only sink for confirmed violations.
/// The durable ledger is an external collaborator; this core only appends.
pub trait ViolationLedger: Send + Sync {
    /// Append one record and return its id.
    fn append(&self, record: &Violation) -> Result<String, StoreError>;
}

/// In-memory [`ViolationLedger`] for tests and ephemeral use.
pub struct MemoryLedger {
    records: Mutex<Vec<Violation>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// All appended records, in order.
    pub fn records(&self) -> Vec<Violation> {
        let records = self.records.lock().expect("lock poisoned");
        records.clone()
    }

    pub fn len(&self) -> usize {
        let records = self.records.lock().expect("lock poisoned");
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ViolationLedger for MemoryLedger {
    fn append(&self, record: &Violation) -> Result<String, StoreError> {
        let mut records = self.records.lock().expect("lock poisoned");
        records.push(record.clone());
        Ok(record.record_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_record_id() {
        let ledger = MemoryLedger::new();
        let record = Violation::new("S1", "late_arrival", None, None);
        let id = ledger.append(&record).unwrap();
        assert_eq!(id, record.record_id);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records()[0].identity_id, "S1");
    }

    #[test]
    fn record_ids_are_unique() {
        let a = Violation::new("S1", "bunk", None, None);
        let b = Violation::new("S1", "bunk", None, None);
        assert_ne!(a.record_id, b.record_id);
    }
}
