use thiserror::Error;

use faceguard_enroll::EnrollError;
use faceguard_extract::ExtractError;
use faceguard_matcher::MatchError;
use faceguard_reconcile::ReconcileError;
use faceguard_store::StoreError;

/// Top-level failures, each with an explicit kind so clients can tell
/// "retake the photo" from "not enrolled" from "try again later".
#[derive(Error, Debug)]
pub enum HostError {
    /// The probe photograph itself was unusable (no face, several faces,
    /// or undecodable). Distinct from a no-match result, which is a
    /// normal [`crate::MatchResult`].
    #[error("faceguard: probe rejected: {0}")]
    ProbeRejected(ExtractError),

    /// The wired extractor produces vectors of a different length than
    /// the deployment is configured for.
    #[error("faceguard: extractor dimension mismatch: extractor {extractor}, configured {configured}")]
    ExtractorDimensionMismatch { extractor: usize, configured: usize },

    #[error("faceguard: {0}")]
    Enroll(#[from] EnrollError),

    #[error("faceguard: {0}")]
    Match(#[from] MatchError),

    #[error("faceguard: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("faceguard: {0}")]
    Store(#[from] StoreError),
}
