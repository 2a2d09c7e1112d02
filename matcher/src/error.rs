use thiserror::Error;

use faceguard_store::StoreError;

/// Infrastructure failures of the match engine. "No match found" is a
/// normal [`crate::MatchResult`], never an error.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("matcher: probe dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("matcher: unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("matcher: {0}")]
    Store(#[from] StoreError),
}
