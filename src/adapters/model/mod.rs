//! Fitted regression models.
//!
//! The model artifact is a JSON document tagged by `kind`. Both kinds predict
//! from the standardized feature vector and expose an exact additive explainer.

mod linear;
mod tree;
mod tree_shap;

pub use linear::{LinearExplainer, LinearModel};
pub use tree::{Node, Tree, TreeEnsemble};
pub use tree_shap::TreeShapExplainer;

use serde::{Deserialize, Serialize};

use crate::ports::{AttributionExplainer, Regressor};
use crate::HgbError;

/// A loaded model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    TreeEnsemble(TreeEnsemble),
    Linear(LinearModel),
}

impl RegressionModel {
    /// # Errors
    /// Returns a description of the first structural problem.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::TreeEnsemble(m) => m.validate(),
            Self::Linear(m) => m.validate(),
        }
    }

    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::TreeEnsemble(m) => m.feature_names.as_deref(),
            Self::Linear(m) => m.feature_names.as_deref(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TreeEnsemble(_) => "tree_ensemble",
            Self::Linear(_) => "linear",
        }
    }
}

impl Regressor for RegressionModel {
    fn n_features(&self) -> usize {
        match self {
            Self::TreeEnsemble(m) => m.num_features,
            Self::Linear(m) => m.n_features(),
        }
    }

    fn predict(&self, features: &[f64]) -> Result<f64, HgbError> {
        if features.len() != self.n_features() {
            return Err(HgbError::Transform(format!(
                "model expects {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }

        Ok(match self {
            Self::TreeEnsemble(m) => m.predict(features),
            Self::Linear(m) => m.predict(features),
        })
    }

    fn explainer(&self) -> Result<Box<dyn AttributionExplainer + '_>, HgbError> {
        Ok(match self {
            Self::TreeEnsemble(m) => Box::new(TreeShapExplainer::new(m)),
            Self::Linear(m) => Box::new(LinearExplainer::new(m)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tagged_linear_model() {
        let json = r#"{"kind":"linear","intercept":1.0,"coefficients":[2.0,3.0]}"#;
        let model: RegressionModel = serde_json::from_str(json).expect("parse");
        assert_eq!(model.kind(), "linear");
        assert_eq!(model.n_features(), 2);
        assert!(model.validate().is_ok());
        assert!((model.predict(&[1.0, 1.0]).expect("predict") - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_parses_tagged_tree_ensemble() {
        let json = r#"{
            "kind": "tree_ensemble",
            "num_features": 1,
            "base_score": 2.0,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 0.0, "left": 1, "right": 2, "cover": 10.0},
                {"value": -1.0, "cover": 5.0},
                {"value": 1.0, "cover": 5.0}
            ]}]
        }"#;
        let model: RegressionModel = serde_json::from_str(json).expect("parse");
        assert_eq!(model.kind(), "tree_ensemble");
        assert!(model.validate().is_ok());
        assert_eq!(model.predict(&[0.5]).expect("predict"), 3.0);

        let explainer = model.explainer().expect("explainer");
        assert_eq!(explainer.expected_value(), 2.0);
        assert_eq!(explainer.attributions(&[0.5]).expect("phi"), vec![1.0]);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = r#"{"kind":"neural_net","layers":[]}"#;
        assert!(serde_json::from_str::<RegressionModel>(json).is_err());
    }

    #[test]
    fn test_predict_rejects_wrong_length() {
        let model = RegressionModel::Linear(LinearModel {
            feature_names: None,
            intercept: 0.0,
            coefficients: vec![1.0; 6],
            feature_means: None,
        });
        let err = model.predict(&[1.0; 5]).expect_err("must fail");
        assert!(matches!(err, HgbError::Transform(_)));
    }
}
