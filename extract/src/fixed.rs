use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::ExtractError;
use crate::extract::FaceExtractor;

/// Table-driven [`FaceExtractor`] with programmed outcomes per image.
/// Intended for tests and offline tooling; bytes it has not been taught
/// are rejected as undecodable.
pub struct FixedExtractor {
    dim: usize,
    outcomes: Mutex<HashMap<Vec<u8>, Result<Vec<f32>, ExtractError>>>,
}

impl FixedExtractor {
    /// Creates an extractor producing vectors of the given dimension.
    /// Panics if `dim` is 0.
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "extract: FixedExtractor dimension must be positive");
        Self {
            dim,
            outcomes: Mutex::new(HashMap::new()),
        }
    }

    /// Teach the extractor to return `vector` for `image`.
    /// The vector length is not checked here; dimension policing is the
    /// consumer's job.
    pub fn learn(&self, image: &[u8], vector: Vec<f32>) {
        let mut outcomes = self.outcomes.lock().expect("lock poisoned");
        outcomes.insert(image.to_vec(), Ok(vector));
    }

    /// Teach the extractor to reject `image` with the given error.
    pub fn reject(&self, image: &[u8], err: ExtractError) {
        let mut outcomes = self.outcomes.lock().expect("lock poisoned");
        outcomes.insert(image.to_vec(), Err(err));
    }
}

impl FaceExtractor for FixedExtractor {
    fn extract(&self, image: &[u8]) -> Result<Vec<f32>, ExtractError> {
        let outcomes = self.outcomes.lock().expect("lock poisoned");
        match outcomes.get(image) {
            Some(outcome) => outcome.clone(),
            None => Err(ExtractError::DecodeError("unrecognized image bytes".into())),
        }
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
