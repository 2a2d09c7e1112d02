//! Identity matching.
//!
//! An in-memory, rebuildable index over every active identity's vector,
//! and the two-phase match protocol on top of it: `propose` is a pure
//! nearest-neighbor query against an immutable snapshot, `confirm` is the
//! only operation with side effects (one counter increment, one ledger
//! record). The split exists so a single physical event probed several
//! times is never double-counted.

mod distance;
mod error;
mod index;
mod matcher;

pub use distance::{confidence, euclidean_distance};
pub use error::MatchError;
pub use index::{IdentityIndex, IndexEntry, IndexSnapshot};
pub use matcher::{CommitResult, ConfirmRequest, MatchCandidate, MatchEngine, MatchQuery, MatchResult};
