use thiserror::Error;

/// Per-image extraction outcomes. All of these are recoverable at the
/// enrollment level: the offending image is skipped, not the whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("extract: no face detected")]
    NoFace,

    #[error("extract: multiple faces detected")]
    MultipleFaces,

    #[error("extract: failed to decode image: {0}")]
    DecodeError(String),
}
