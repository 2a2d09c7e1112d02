/// Deployment policy for enrollment and matching.
///
/// The image floor and the acceptance threshold are environment-scoped
/// configuration, not constants: observed deployments ran floors from 1
/// to 3 and thresholds around 0.45-0.50.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity vector dimensionality; must match the extractor.
    pub dimension: usize,

    /// Minimum images that must pass the quality gate per enrollment.
    pub min_valid_images: usize,

    /// Accept a match when the best distance is strictly below this.
    pub threshold: f32,
}

impl Config {
    /// Fill zero-valued fields with the common deployment defaults.
    pub fn with_defaults(mut self) -> Self {
        if self.dimension == 0 {
            self.dimension = 128;
        }
        if self.min_valid_images == 0 {
            self.min_valid_images = 1;
        }
        if self.threshold == 0.0 {
            self.threshold = 0.45;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dimension: 128,
            min_valid_images: 1,
            threshold: 0.45,
        }
    }
}
