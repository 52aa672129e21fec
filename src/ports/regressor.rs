//! Regressor port: Traits for inference and additive attribution.
//!
//! This trait abstracts the fitted model from the application logic so the
//! pipeline can run against tree ensembles, linear models or test doubles.

use crate::HgbError;

/// A fitted regression model over standardized features.
pub trait Regressor: Send + Sync {
    /// Number of features the model expects.
    fn n_features(&self) -> usize;

    /// Predict a scalar output for one standardized feature vector.
    ///
    /// # Errors
    /// Returns `HgbError::Transform` if the vector length does not match
    /// `n_features()`.
    fn predict(&self, features: &[f64]) -> Result<f64, HgbError>;

    /// Build an attribution explainer bound to this model.
    ///
    /// # Errors
    /// Returns `HgbError::Explainer` if the model type cannot be explained.
    fn explainer(&self) -> Result<Box<dyn AttributionExplainer + '_>, HgbError>;
}

/// Computes additive per-feature attributions for a bound model.
///
/// For every input `x`: `expected_value() + sum(attributions(x)) ≈ predict(x)`.
pub trait AttributionExplainer {
    /// Mean model output over the training distribution.
    fn expected_value(&self) -> f64;

    /// One signed contribution per feature, in input order.
    ///
    /// # Errors
    /// Returns `HgbError::Explainer` if attribution cannot be computed.
    fn attributions(&self, features: &[f64]) -> Result<Vec<f64>, HgbError>;
}
