//! Identity enrollment.
//!
//! Turns 1..N submitted or discovered photographs into one stable identity
//! vector per subject: each image passes through the extractor's quality
//! gate, the survivors are averaged coordinate-wise into a centroid, and
//! the identity record is activated in a single atomic update. This crate
//! owns the pending-to-active transition; nothing else makes it.

mod centroid;
mod enroll;
mod error;
mod locks;

pub use centroid::centroid;
pub use enroll::{CandidateImage, EnrollConfig, Enroller, PendingReport};
pub use error::EnrollError;
