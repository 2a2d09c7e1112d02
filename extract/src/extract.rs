use crate::error::ExtractError;

/// FaceExtractor converts encoded image bytes into dense float32 identity
/// vectors.
///
/// Implementations must be safe for concurrent use (Send + Sync) and
/// deterministic: the same image bytes always produce the same outcome.
/// An image containing zero faces or more than one face is rejected with
/// the matching [`ExtractError`], never guessed at.
pub trait FaceExtractor: Send + Sync {
    /// Return the identity vector for a single encoded image.
    fn extract(&self, image: &[u8]) -> Result<Vec<f32>, ExtractError>;

    /// Return the dimensionality of the output vectors.
    /// Fixed for the lifetime of a deployment.
    fn dimension(&self) -> usize;
}
