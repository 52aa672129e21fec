//! Feature scaler port: Trait for the fitted input transform.

use crate::HgbError;

/// A fitted feature transform applied before inference.
///
/// Implementations are immutable after construction and shared read-only.
pub trait FeatureScaler: Send + Sync {
    /// Number of features the transform was fitted on.
    fn n_features(&self) -> usize;

    /// Transform one raw feature vector into model space.
    ///
    /// # Errors
    /// Returns `HgbError::Transform` if `raw` does not have `n_features()` entries
    /// or contains non-finite values.
    fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, HgbError>;
}
