//! Prediction service: raw clinical input to predicted post-transfusion HGB.
//!
//! Steps:
//! 1. Range validation against the feature schema
//! 2. Assembly of the feature vector in schema order
//! 3. Scaler transform
//! 4. Model inference
//!
//! Shape mismatches are reported as `HgbError::Transform`, never coerced.

use std::sync::Arc;

use crate::domain::{ClinicalInput, FeatureVector, HgbPrediction};
use crate::ports::{FeatureScaler, Regressor};
use crate::HgbError;

/// Everything produced by one successful prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub prediction: HgbPrediction,
    /// Raw features in schema order
    pub features: FeatureVector,
    /// Standardized features as seen by the model
    pub scaled: Vec<f64>,
}

/// Runs the scaler and model over validated clinical input.
pub struct PredictionService<S, R>
where
    S: FeatureScaler,
    R: Regressor + ?Sized,
{
    scaler: Option<Arc<S>>,
    model: Option<Arc<R>>,
}

impl<S, R> PredictionService<S, R>
where
    S: FeatureScaler,
    R: Regressor + ?Sized,
{
    /// `None` marks an artifact that failed to load.
    pub fn new(scaler: Option<Arc<S>>, model: Option<Arc<R>>) -> Self {
        Self { scaler, model }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scaler.is_some() && self.model.is_some()
    }

    /// Predict post-transfusion HGB for one submission.
    ///
    /// # Errors
    /// - `ScalerNotLoaded` / `ModelNotLoaded` if an artifact is missing
    /// - `Validation` if a field is out of range
    /// - `Transform` on a shape mismatch or a non-finite result
    pub fn predict(&self, input: &ClinicalInput) -> Result<PredictionOutcome, HgbError> {
        let scaler = self.scaler.as_ref().ok_or(HgbError::ScalerNotLoaded)?;
        let model = self.model.as_ref().ok_or(HgbError::ModelNotLoaded)?;

        input
            .validate()
            .map_err(|errors| HgbError::Validation(errors.join("; ")))?;

        let features = input.to_feature_vector();
        if scaler.n_features() != features.as_slice().len() {
            return Err(HgbError::Transform(format!(
                "scaler expects {} features, input has {}",
                scaler.n_features(),
                features.as_slice().len()
            )));
        }

        let scaled = scaler.transform(features.as_slice())?;
        if scaled.len() != model.n_features() {
            return Err(HgbError::Transform(format!(
                "model expects {} features, scaler produced {}",
                model.n_features(),
                scaled.len()
            )));
        }

        let value = model.predict(&scaled)?;
        if !value.is_finite() {
            return Err(HgbError::Transform(format!(
                "model produced a non-finite prediction ({value})"
            )));
        }

        tracing::debug!(prediction = value, "Prediction computed");

        Ok(PredictionOutcome {
            prediction: HgbPrediction::new(value, f64::from(input.hgb_before)),
            features,
            scaled,
        })
    }
}
