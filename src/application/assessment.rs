//! Assessment service: one submission through prediction and explanation.
//!
//! Prediction and explanation fail independently. A failed explanation still
//! returns the numeric prediction; a failed prediction returns no result at all.

use std::sync::Arc;

use crate::adapters::artifacts::{IntegrityVerifier, LoadedArtifacts};
use crate::adapters::{ArtifactError, ArtifactLoader, RegressionModel, StandardScaler};
use crate::application::{ExplanationService, PredictionOutcome, PredictionService};
use crate::config::AppConfig;
use crate::domain::{ClinicalInput, Explanation};
use crate::ports::{FeatureScaler, Regressor};
use crate::HgbError;

/// Result of one submission.
#[derive(Debug)]
pub struct Assessment {
    pub outcome: PredictionOutcome,
    /// Attribution, or the reason it could not be computed
    pub explanation: Result<Explanation, HgbError>,
}

/// Owns the loaded artifacts for the lifetime of the process.
pub struct AssessmentService<S = StandardScaler, R = RegressionModel>
where
    S: FeatureScaler,
    R: Regressor + ?Sized,
{
    prediction: PredictionService<S, R>,
    explanation: Option<ExplanationService<R>>,
    startup_errors: Vec<ArtifactError>,
}

impl AssessmentService<StandardScaler, RegressionModel> {
    /// Load artifacts as described by `config`.
    ///
    /// Never fails: load errors are kept and reported through `startup_errors()`.
    #[must_use]
    pub fn startup(config: &AppConfig) -> Self {
        let paths = config.artifact_paths();
        tracing::info!(
            "Loading artifacts (integrity policy: {})",
            config.integrity
        );

        let loaded = match IntegrityVerifier::from_key_file(
            config.integrity,
            config.pubkey_file.as_deref(),
        ) {
            Ok(verifier) => ArtifactLoader::new(verifier).load(&paths),
            Err(reason) => {
                tracing::error!("Artifact public key unavailable: {reason}");
                LoadedArtifacts::integrity_failure(&paths, &reason)
            }
        };

        Self::from_loaded(loaded)
    }

    #[must_use]
    pub fn from_loaded(loaded: LoadedArtifacts) -> Self {
        let mut startup_errors = Vec::new();
        let scaler = loaded.scaler.map_err(|e| startup_errors.push(e)).ok();
        let model = loaded.model.map_err(|e| startup_errors.push(e)).ok();

        let mut service = Self::new(scaler, model);
        service.startup_errors = startup_errors;
        service
    }
}

impl<S, R> AssessmentService<S, R>
where
    S: FeatureScaler,
    R: Regressor + ?Sized,
{
    pub fn new(scaler: Option<Arc<S>>, model: Option<Arc<R>>) -> Self {
        let explanation = model.clone().map(ExplanationService::new);
        Self {
            prediction: PredictionService::new(scaler, model),
            explanation,
            startup_errors: Vec::new(),
        }
    }

    /// Whether submissions can produce a prediction.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.prediction.is_ready()
    }

    /// Artifact errors recorded at startup, scaler first.
    #[must_use]
    pub fn startup_errors(&self) -> &[ArtifactError] {
        &self.startup_errors
    }

    /// Predict and explain one submission.
    ///
    /// # Errors
    /// Returns the prediction error; explanation errors are carried inside the
    /// returned `Assessment`.
    pub fn assess(&self, input: &ClinicalInput) -> Result<Assessment, HgbError> {
        let outcome = self.prediction.predict(input)?;

        let explanation = match &self.explanation {
            Some(service) => service.explain(&outcome),
            None => Err(HgbError::ModelNotLoaded),
        };
        if let Err(e) = &explanation {
            tracing::warn!("Explanation unavailable: {e}");
        }

        Ok(Assessment {
            outcome,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifacts::{ArtifactKind, ArtifactPaths};
    use crate::domain::Gender;
    use crate::ports::AttributionExplainer;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bundled() -> AssessmentService {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let loaded = ArtifactLoader::default().load(&ArtifactPaths::in_dir(&dir));
        let service = AssessmentService::from_loaded(loaded);
        assert!(service.is_ready(), "{:?}", service.startup_errors());
        service
    }

    fn golden_input() -> ClinicalInput {
        ClinicalInput {
            age: 30,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 70.0,
            transfusion_units: 0,
            hgb_before: 120,
        }
    }

    #[test]
    fn test_golden_prediction_and_attribution() {
        let assessment = bundled().assess(&golden_input()).expect("assess");
        let prediction = assessment.outcome.prediction;
        assert!((prediction.predicted - 96.70).abs() < 1e-6);
        assert!((prediction.delta() + 23.30).abs() < 1e-6);
        assert_eq!(prediction.display_value(), "96.70 g/L");

        let explanation = assessment.explanation.expect("explanation");
        assert!((explanation.baseline - 88.9).abs() < 1e-6);

        let expected = [0.225, 1.5, 0.0, 1.1, -5.7, 10.675];
        for (c, e) in explanation.contributions.iter().zip(expected) {
            assert!((c.value - e).abs() < 1e-6, "{}: {} != {e}", c.label, c.value);
        }
        assert!(explanation.additivity_gap() < 1e-6);

        let top = explanation.ranked()[0];
        assert_eq!(top.label, "Pre-transfusion HGB");
    }

    #[test]
    fn test_boundary_inputs_predict() {
        let service = bundled();
        let low = ClinicalInput {
            age: 0,
            gender: Gender::Female,
            height_cm: 20.0,
            weight_kg: 10.0,
            transfusion_units: 0,
            hgb_before: 20,
        };
        let high = ClinicalInput {
            age: 100,
            gender: Gender::Male,
            height_cm: 250.0,
            weight_kg: 200.0,
            transfusion_units: 12,
            hgb_before: 200,
        };
        for input in [low, high] {
            let assessment = service.assess(&input).expect("assess");
            assert!(assessment.outcome.prediction.predicted.is_finite());
            let explanation = assessment.explanation.expect("explanation");
            assert!(explanation.additivity_gap() < 1e-3);
        }
    }

    #[test]
    fn test_assessment_is_deterministic() {
        let service = bundled();
        let input = ClinicalInput {
            age: 67,
            gender: Gender::Female,
            height_cm: 158.5,
            weight_kg: 51.2,
            transfusion_units: 2,
            hgb_before: 64,
        };
        let a = service.assess(&input).expect("assess");
        let b = service.assess(&input).expect("assess");
        assert_eq!(a.outcome.scaled, b.outcome.scaled);
        assert_eq!(
            a.outcome.prediction.predicted,
            b.outcome.prediction.predicted
        );
        assert_eq!(
            a.explanation.expect("explanation").contributions,
            b.explanation.expect("explanation").contributions
        );
    }

    /// Counts calls so tests can assert that inference never ran.
    struct CountingModel {
        calls: AtomicUsize,
    }

    struct NoExplainer;

    impl AttributionExplainer for NoExplainer {
        fn expected_value(&self) -> f64 {
            0.0
        }

        fn attributions(&self, _features: &[f64]) -> Result<Vec<f64>, HgbError> {
            Err(HgbError::Explainer("unsupported".into()))
        }
    }

    impl Regressor for CountingModel {
        fn n_features(&self) -> usize {
            6
        }

        fn predict(&self, _features: &[f64]) -> Result<f64, HgbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(100.0)
        }

        fn explainer(&self) -> Result<Box<dyn AttributionExplainer + '_>, HgbError> {
            Ok(Box::new(NoExplainer))
        }
    }

    #[test]
    fn test_missing_scaler_never_predicts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = ArtifactLoader::default().load(&ArtifactPaths::in_dir(temp.path()));
        let from_disk = AssessmentService::from_loaded(loaded);
        assert!(!from_disk.is_ready());
        assert!(matches!(
            from_disk.startup_errors()[0],
            ArtifactError::NotFound {
                kind: ArtifactKind::Scaler,
                ..
            }
        ));

        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let service: AssessmentService<StandardScaler, CountingModel> =
            AssessmentService::new(None, Some(Arc::clone(&model)));
        let err = service
            .assess(&golden_input())
            .expect_err("must fail");
        assert!(matches!(err, HgbError::ScalerNotLoaded));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_explanation_failure_keeps_prediction() {
        let scaler = Arc::new(StandardScaler::new(vec![0.0; 6], vec![1.0; 6]).expect("scaler"));
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let service = AssessmentService::new(Some(scaler), Some(Arc::clone(&model)));

        let assessment = service.assess(&golden_input()).expect("assess");
        assert_eq!(assessment.outcome.prediction.predicted, 100.0);
        assert!(matches!(
            assessment.explanation,
            Err(HgbError::Explainer(_))
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scaler_with_five_features_is_transform_error() {
        let scaler = Arc::new(StandardScaler::new(vec![0.0; 5], vec![1.0; 5]).expect("scaler"));
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let service = AssessmentService::new(Some(scaler), Some(Arc::clone(&model)));
        assert!(matches!(
            service.assess(&golden_input()),
            Err(HgbError::Transform(_))
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }
}
