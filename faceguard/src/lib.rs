//! Face identity enrollment, storage reconciliation and matching.
//!
//! The [`Host`] is the process-level entry point: it wires an embedding
//! extractor, an identity document store, an image tree and a violation
//! ledger into the enrollment engine, the storage reconciler and the
//! two-phase match engine, sharing one rebuildable index of active
//! identity vectors between them.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use faceguard::{Config, Host, HostConfig, ConfirmRequest, FixedExtractor};
//!
//! let host = Host::new(HostConfig {
//!     policy: Config::default(),
//!     extractor: Arc::new(FixedExtractor::new(128)),
//!     store: Arc::new(faceguard_store::MemoryStore::new()),
//!     images: Arc::new(faceguard_filestore::MemoryStore::new()),
//!     ledger: Arc::new(faceguard_store::MemoryLedger::new()),
//!     captures: None,
//!     reconcile: Default::default(),
//! }).unwrap();
//!
//! // Align records with the image tree, then derive vectors for whatever
//! // turned up pending.
//! host.sync().unwrap();
//! host.enroll_pending().unwrap();
//!
//! // Two-phase matching: propose is read-only and retriable; only an
//! // explicit confirm commits a violation.
//! let result = host.identify(b"probe image bytes", &[]).unwrap();
//! if let (true, Some(best)) = (result.accepted, &result.best) {
//!     host.confirm(&best.identity_id, &ConfirmRequest::default()).unwrap();
//! }
//! ```

mod config;
mod error;
mod host;

pub use config::Config;
pub use error::HostError;
pub use host::{Host, HostConfig};

pub use faceguard_enroll::{CandidateImage, EnrollError, PendingReport};
pub use faceguard_extract::{ExtractError, FaceExtractor, FixedExtractor};
pub use faceguard_matcher::{
    CommitResult, ConfirmRequest, MatchCandidate, MatchError, MatchQuery, MatchResult,
};
pub use faceguard_reconcile::{ReconcileError, ReconcilerConfig, SweepReport};
pub use faceguard_store::{
    FaceStatus, Identity, IdentityStore, StoreError, Violation, ViolationLedger,
};

#[cfg(test)]
mod tests;
