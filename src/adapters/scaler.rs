//! Standard scaler: `z = (x - mean) / scale`, fitted offline.

use serde::{Deserialize, Serialize};

use crate::ports::FeatureScaler;
use crate::HgbError;

/// Per-feature standardization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Training column labels, in input order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    pub mean: Vec<f64>,

    /// Standard deviation per feature; strictly positive
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// # Errors
    /// Returns a reason string if the parameters are inconsistent.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        let scaler = Self {
            feature_names: None,
            mean,
            scale,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("mean must not be empty".into());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries, scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean[{i}] is not finite"));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s <= 0.0) {
            return Err(format!(
                "scale[{i}] must be finite and positive, got {}",
                self.scale[i]
            ));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(format!(
                    "feature_names has {} entries, expected {}",
                    names.len(),
                    self.mean.len()
                ));
            }
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, raw: &[f64]) -> Result<Vec<f64>, HgbError> {
        if raw.len() != self.n_features() {
            return Err(HgbError::Transform(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                raw.len()
            )));
        }
        if let Some(i) = raw.iter().position(|v| !v.is_finite()) {
            return Err(HgbError::Transform(format!("feature {i} is not finite")));
        }

        Ok(raw
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}
