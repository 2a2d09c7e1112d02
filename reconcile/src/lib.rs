//! Storage reconciliation.
//!
//! The image tree and the identity records drift apart: files are copied
//! in by hand, directories move between layout generations, records point
//! at images that no longer exist. The reconciler walks both sides and
//! repairs the bookkeeping: it demotes identities whose files vanished or
//! changed, registers pending identities for orphan files, and tags each
//! record with the layout it was found under. It never computes a vector;
//! activation stays with the enrollment engine.

mod error;
mod reconcile;

pub use error::ReconcileError;
pub use reconcile::{Reconciler, ReconcilerConfig, SweepReport};
