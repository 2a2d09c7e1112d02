//! Face embedding extraction contract.
//!
//! The extractor turns an encoded enrollment or probe photograph into a
//! fixed-length identity vector, or rejects it when no face (or more than
//! one face) is present. The real network lives outside this workspace;
//! everything here consumes it through [`FaceExtractor`].

mod error;
mod extract;
mod fixed;

pub use error::ExtractError;
pub use extract::FaceExtractor;
pub use fixed::FixedExtractor;
