//! Additive feature attribution for a single prediction.

use serde::{Deserialize, Serialize};

/// Contribution of one input feature to the prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Schema position
    pub index: usize,
    /// Display label
    pub label: String,
    /// Raw input as shown to the user (with unit)
    pub display_value: String,
    /// Standardized value the model saw
    pub scaled_value: f64,
    /// Signed contribution in g/L
    pub value: f64,
}

/// Attribution vector plus its reference point.
///
/// `baseline + sum(contributions) ≈ prediction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Expected model output over the training distribution, E[f(x)]
    pub baseline: f64,
    /// Model output for this input, f(x)
    pub prediction: f64,
    /// One entry per feature, in schema order
    pub contributions: Vec<FeatureContribution>,
}

/// One bar of the waterfall chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallRow {
    pub label: String,
    /// Raw input text; `None` for the collapsed remainder row
    pub display_value: Option<String>,
    pub value: f64,
    /// Cumulative position where the bar starts
    pub start: f64,
    /// Cumulative position where the bar ends (`start + value`)
    pub end: f64,
}

impl WaterfallRow {
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.value >= 0.0
    }
}

impl Explanation {
    /// Sum of all contributions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.contributions.iter().map(|c| c.value).sum()
    }

    /// `|baseline + total - prediction|`
    #[must_use]
    pub fn additivity_gap(&self) -> f64 {
        (self.baseline + self.total() - self.prediction).abs()
    }

    /// Contributions ordered by absolute magnitude, largest first.
    ///
    /// Ties keep schema order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut ranked: Vec<&FeatureContribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        ranked
    }

    /// Waterfall rows in display order (top row first).
    ///
    /// At most `max_display` rows are produced. When there are more features, the
    /// top `max_display - 1` are kept and the remainder collapses into a single
    /// bottom row. The bottom row starts at the baseline; the top row ends at
    /// `baseline + total()`.
    #[must_use]
    pub fn waterfall(&self, max_display: usize) -> Vec<WaterfallRow> {
        let max_display = max_display.max(1);
        let ranked = self.ranked();

        let mut rows: Vec<WaterfallRow> = Vec::with_capacity(max_display);
        let (shown, rest) = if ranked.len() > max_display {
            ranked.split_at(max_display - 1)
        } else {
            (ranked.as_slice(), &[][..])
        };

        for contribution in shown {
            rows.push(WaterfallRow {
                label: contribution.label.clone(),
                display_value: Some(contribution.display_value.clone()),
                value: contribution.value,
                start: 0.0,
                end: 0.0,
            });
        }

        if !rest.is_empty() {
            rows.push(WaterfallRow {
                label: format!("{} other features", rest.len()),
                display_value: None,
                value: rest.iter().map(|c| c.value).sum(),
                start: 0.0,
                end: 0.0,
            });
        }

        let mut cursor = self.baseline;
        for row in rows.iter_mut().rev() {
            row.start = cursor;
            cursor += row.value;
            row.end = cursor;
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(index: usize, label: &str, value: f64) -> FeatureContribution {
        FeatureContribution {
            index,
            label: label.to_string(),
            display_value: format!("v{index}"),
            scaled_value: 0.0,
            value,
        }
    }

    fn sample() -> Explanation {
        Explanation {
            baseline: 88.9,
            prediction: 96.7,
            contributions: vec![
                contribution(0, "Age", 0.225),
                contribution(1, "Gender", 1.5),
                contribution(2, "Height", 0.0),
                contribution(3, "Weight", 1.1),
                contribution(4, "Transfusion", -5.7),
                contribution(5, "Pre-transfusion HGB", 10.675),
            ],
        }
    }

    #[test]
    fn test_additivity_gap() {
        let explanation = sample();
        assert!((explanation.total() - 7.8).abs() < 1e-9);
        assert!(explanation.additivity_gap() < 1e-9);
    }

    #[test]
    fn test_ranked_by_magnitude() {
        let explanation = sample();
        let labels: Vec<&str> = explanation
            .ranked()
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["Pre-transfusion HGB", "Transfusion", "Gender", "Weight", "Age", "Height"]
        );
    }

    #[test]
    fn test_waterfall_shows_all_six_under_cap() {
        let explanation = sample();
        let rows = explanation.waterfall(10);

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].label, "Pre-transfusion HGB");
        assert!((rows[0].end - 96.7).abs() < 1e-9);
        assert!((rows[5].start - 88.9).abs() < 1e-9);
        for pair in rows.windows(2) {
            assert!((pair[0].start - pair[1].end).abs() < 1e-9);
        }
        assert!(rows.iter().all(|r| r.display_value.is_some()));
    }

    #[test]
    fn test_waterfall_collapses_remainder() {
        let explanation = sample();
        let rows = explanation.waterfall(3);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "Pre-transfusion HGB");
        assert_eq!(rows[1].label, "Transfusion");
        assert_eq!(rows[2].label, "4 other features");
        assert!(rows[2].display_value.is_none());
        assert!((rows[2].value - 2.825).abs() < 1e-9);
        assert!((rows[2].start - 88.9).abs() < 1e-9);
        assert!((rows[0].end - 96.7).abs() < 1e-9);
    }
}
