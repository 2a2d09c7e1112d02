//! Identity document store interface and implementations.
//!
//! Identities are kept as one document per subject in an opaque keyed
//! collection with atomic single-document updates. An in-memory
//! implementation backs tests; a redb-backed implementation provides
//! persistence. The violation ledger consumed by match confirmation lives
//! here too, as a narrow append-only contract.

mod error;
mod ledger;
mod memory;
mod model;
mod redb;
mod store;

pub use error::StoreError;
pub use ledger::{MemoryLedger, Violation, ViolationLedger};
pub use memory::MemoryStore;
pub use model::{FaceStatus, Identity, normalize_group, normalize_id};
pub use self::redb::RedbStore;
pub use store::{IdentityFilter, IdentityStore, TOTAL_COUNTER};
