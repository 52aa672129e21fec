//! Explanation service: per-feature attribution of one prediction.

use std::sync::Arc;

use crate::application::PredictionOutcome;
use crate::domain::schema::{FieldKind, GENDER};
use crate::domain::{Explanation, FeatureContribution, FieldDescriptor, Gender};
use crate::ports::Regressor;
use crate::HgbError;

/// Maximum allowed `|baseline + sum(attributions) - prediction|`, in g/L.
pub const ADDITIVITY_TOLERANCE: f64 = 1e-3;

/// Number of bars shown in the waterfall chart.
pub const MAX_DISPLAY: usize = 10;

/// Builds additive attributions from the model's explainer.
pub struct ExplanationService<R: Regressor + ?Sized> {
    model: Arc<R>,
}

impl<R: Regressor + ?Sized> ExplanationService<R> {
    pub fn new(model: Arc<R>) -> Self {
        Self { model }
    }

    /// Explain a prediction produced from the same model.
    ///
    /// # Errors
    /// Returns `HgbError::Explainer` if the explainer fails, returns the wrong
    /// number of values, produces non-finite values, or breaks the sum law.
    pub fn explain(&self, outcome: &PredictionOutcome) -> Result<Explanation, HgbError> {
        let explainer = self.model.explainer()?;
        let baseline = explainer.expected_value();
        let phi = explainer.attributions(&outcome.scaled)?;

        if phi.len() != outcome.scaled.len() {
            return Err(HgbError::Explainer(format!(
                "explainer returned {} attributions for {} features",
                phi.len(),
                outcome.scaled.len()
            )));
        }
        if !baseline.is_finite() || phi.iter().any(|v| !v.is_finite()) {
            return Err(HgbError::Explainer("non-finite attribution".into()));
        }

        let contributions = outcome
            .features
            .iter()
            .zip(outcome.scaled.iter().zip(&phi))
            .enumerate()
            .map(|(index, ((field, raw), (scaled, value)))| FeatureContribution {
                index,
                label: field.label.to_string(),
                display_value: format_raw(index, field, raw),
                scaled_value: *scaled,
                value: *value,
            })
            .collect();

        let explanation = Explanation {
            baseline,
            prediction: outcome.prediction.predicted,
            contributions,
        };

        let gap = explanation.additivity_gap();
        if gap > ADDITIVITY_TOLERANCE {
            return Err(HgbError::Explainer(format!(
                "attributions do not add up to the prediction (gap {gap:.6})"
            )));
        }

        tracing::debug!(baseline, gap, "Explanation computed");
        Ok(explanation)
    }
}

/// Raw input as shown beside its bar, e.g. `170.0 cm` or `男`.
fn format_raw(index: usize, field: &FieldDescriptor, raw: f64) -> String {
    let number = match field.kind {
        FieldKind::Binary if index == GENDER => {
            let gender = if raw >= 0.5 {
                Gender::Male
            } else {
                Gender::Female
            };
            return gender.label().to_string();
        }
        FieldKind::Integer | FieldKind::Binary => format!("{raw:.0}"),
        FieldKind::Continuous => format!("{raw:.1}"),
    };

    if field.unit.is_empty() {
        number
    } else {
        format!("{number} {}", field.unit)
    }
}
