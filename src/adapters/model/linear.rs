//! Linear regression over standardized features.

use serde::{Deserialize, Serialize};

use crate::ports::AttributionExplainer;
use crate::HgbError;

/// `y = intercept + sum(coefficients[i] * x[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    pub intercept: f64,

    pub coefficients: Vec<f64>,

    /// Training means in model space; zero when omitted (standardized inputs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_means: Option<Vec<f64>>,
}

impl LinearModel {
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("coefficients must not be empty".into());
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not finite".into());
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(format!("coefficient {i} is not finite"));
        }
        if let Some(means) = &self.feature_means {
            if means.len() != self.coefficients.len() {
                return Err(format!(
                    "feature_means has {} entries, expected {}",
                    means.len(),
                    self.coefficients.len()
                ));
            }
            if let Some(i) = means.iter().position(|m| !m.is_finite()) {
                return Err(format!("feature mean {i} is not finite"));
            }
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.coefficients.len() {
                return Err(format!(
                    "feature_names has {} entries, expected {}",
                    names.len(),
                    self.coefficients.len()
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    #[must_use]
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    fn mean(&self, index: usize) -> f64 {
        self.feature_means
            .as_ref()
            .map_or(0.0, |means| means[index])
    }
}

/// Closed-form Shapley values for a linear model with independent features.
pub struct LinearExplainer<'a> {
    model: &'a LinearModel,
}

impl<'a> LinearExplainer<'a> {
    #[must_use]
    pub fn new(model: &'a LinearModel) -> Self {
        Self { model }
    }
}

impl AttributionExplainer for LinearExplainer<'_> {
    fn expected_value(&self) -> f64 {
        self.model.intercept
            + self
                .model
                .coefficients
                .iter()
                .enumerate()
                .map(|(i, c)| c * self.model.mean(i))
                .sum::<f64>()
    }

    fn attributions(&self, features: &[f64]) -> Result<Vec<f64>, HgbError> {
        if features.len() != self.model.n_features() {
            return Err(HgbError::Explainer(format!(
                "expected {} features, got {}",
                self.model.n_features(),
                features.len()
            )));
        }

        Ok(self
            .model
            .coefficients
            .iter()
            .zip(features)
            .enumerate()
            .map(|(i, (c, x))| c * (x - self.model.mean(i)))
            .collect())
    }
}
