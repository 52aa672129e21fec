//! Prediction result types.

use serde::{Deserialize, Serialize};

/// A single post-transfusion HGB prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HgbPrediction {
    /// Predicted post-transfusion HGB in g/L
    pub predicted: f64,

    /// Pre-transfusion HGB the prediction was made from, in g/L
    pub hgb_before: f64,

    /// Timestamp of the assessment
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl HgbPrediction {
    #[must_use]
    pub fn new(predicted: f64, hgb_before: f64) -> Self {
        Self {
            predicted,
            hgb_before,
            assessed_at: chrono::Utc::now(),
        }
    }

    /// Change relative to the pre-transfusion value (g/L).
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.predicted - self.hgb_before
    }

    /// Metric text, e.g. `96.70 g/L`.
    #[must_use]
    pub fn display_value(&self) -> String {
        format!("{:.2} g/L", self.predicted)
    }

    /// Delta text, e.g. `-23.30 g/L vs. pre-transfusion`.
    #[must_use]
    pub fn display_delta(&self) -> String {
        format!("{:+.2} g/L vs. pre-transfusion", self.delta())
    }
}

/// Reference ranges shown beside the prediction.
pub mod reference {
    /// Normal adult male HGB range (g/L)
    pub const MALE: (f64, f64) = (130.0, 175.0);
    /// Normal adult female HGB range (g/L)
    pub const FEMALE: (f64, f64) = (115.0, 150.0);
}
