//! Artifact adapter: loads the fitted scaler and model from JSON files.
//!
//! # Loading
//!
//! Each artifact goes through the same steps, and the two are loaded
//! independently so one failure never hides the other:
//! 1. Existence check (`ArtifactError::NotFound`)
//! 2. Integrity check against `manifest.json` (`ArtifactError::Integrity`)
//! 3. JSON deserialization and structural validation (`ArtifactError::Corrupt`)
//! 4. Feature count and name order against `FEATURE_SCHEMA` (`ArtifactError::Corrupt`)
//!
//! Loaded artifacts are immutable and shared behind `Arc`.

pub mod integrity;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::adapters::model::RegressionModel;
use crate::adapters::scaler::StandardScaler;
use crate::domain::schema::{check_feature_names, FEATURE_COUNT};
use crate::ports::{FeatureScaler, Regressor};

pub use integrity::{IntegrityPolicy, IntegrityVerifier, Manifest, Verification};

/// Default model file name inside the artifact directory.
pub const MODEL_FILE: &str = "xgboost_model.json";

/// Default scaler file name inside the artifact directory.
pub const SCALER_FILE: &str = "scaler.json";

/// Which artifact an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Scaler,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Model => "Model",
            Self::Scaler => "Scaler",
        })
    }
}

/// Startup failures. Each disables prediction but not the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("{kind} artifact not found: {}", path.display())]
    NotFound { kind: ArtifactKind, path: PathBuf },

    #[error("{kind} artifact is corrupt ({}): {reason}", path.display())]
    Corrupt {
        kind: ArtifactKind,
        path: PathBuf,
        reason: String,
    },

    #[error("{kind} artifact failed integrity check ({}): {reason}", path.display())]
    Integrity {
        kind: ArtifactKind,
        path: PathBuf,
        reason: String,
    },
}

impl ArtifactError {
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::NotFound { kind, .. }
            | Self::Corrupt { kind, .. }
            | Self::Integrity { kind, .. } => *kind,
        }
    }
}

/// Locations of the two artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
        }
    }

    fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Model => &self.model,
            ArtifactKind::Scaler => &self.scaler,
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("models"))
    }
}

/// Result of startup loading: each artifact succeeded or failed on its own.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub scaler: Result<Arc<StandardScaler>, ArtifactError>,
    pub model: Result<Arc<RegressionModel>, ArtifactError>,
}

impl LoadedArtifacts {
    /// Both artifacts fail with the same integrity reason.
    #[must_use]
    pub fn integrity_failure(paths: &ArtifactPaths, reason: &str) -> Self {
        let fail = |kind: ArtifactKind| ArtifactError::Integrity {
            kind,
            path: paths.get(kind).to_path_buf(),
            reason: reason.to_string(),
        };
        Self {
            scaler: Err(fail(ArtifactKind::Scaler)),
            model: Err(fail(ArtifactKind::Model)),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scaler.is_ok() && self.model.is_ok()
    }

    /// Startup errors in display order (scaler first).
    #[must_use]
    pub fn errors(&self) -> Vec<&ArtifactError> {
        [self.scaler.as_ref().err(), self.model.as_ref().err()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Reads, verifies and validates artifacts.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLoader {
    verifier: IntegrityVerifier,
}

impl ArtifactLoader {
    #[must_use]
    pub fn new(verifier: IntegrityVerifier) -> Self {
        Self { verifier }
    }

    /// Load both artifacts. Never fails as a whole.
    pub fn load(&self, paths: &ArtifactPaths) -> LoadedArtifacts {
        let scaler = self.load_scaler(&paths.scaler).map(Arc::new);
        if let Err(e) = &scaler {
            tracing::error!("{e}");
        }

        let model = self.load_model(&paths.model).map(Arc::new);
        if let Err(e) = &model {
            tracing::error!("{e}");
        }

        LoadedArtifacts { scaler, model }
    }

    /// # Errors
    /// Returns `ArtifactError` for a missing, tampered or invalid scaler.
    pub fn load_scaler(&self, path: &Path) -> Result<StandardScaler, ArtifactError> {
        let kind = ArtifactKind::Scaler;
        let scaler: StandardScaler = self.read_json(kind, path)?;
        scaler.validate().map_err(|reason| corrupt(kind, path, reason))?;
        check_schema(kind, path, scaler.n_features(), scaler.feature_names.as_deref())?;

        tracing::info!(
            "Loaded scaler from {} ({} features)",
            path.display(),
            scaler.n_features()
        );
        Ok(scaler)
    }

    /// # Errors
    /// Returns `ArtifactError` for a missing, tampered or invalid model.
    pub fn load_model(&self, path: &Path) -> Result<RegressionModel, ArtifactError> {
        let kind = ArtifactKind::Model;
        let model: RegressionModel = self.read_json(kind, path)?;
        model.validate().map_err(|reason| corrupt(kind, path, reason))?;
        check_schema(kind, path, model.n_features(), model.feature_names())?;

        tracing::info!(
            "Loaded {} model from {} ({} features)",
            model.kind(),
            path.display(),
            model.n_features()
        );
        Ok(model)
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        kind: ArtifactKind,
        path: &Path,
    ) -> Result<T, ArtifactError> {
        if !path.is_file() {
            return Err(ArtifactError::NotFound {
                kind,
                path: path.to_path_buf(),
            });
        }

        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ArtifactError::NotFound {
                kind,
                path: path.to_path_buf(),
            },
            _ => corrupt(kind, path, format!("read failed: {e}")),
        })?;

        // Hash and parse the same buffer
        self.verifier
            .verify(path, &bytes)
            .map_err(|reason| ArtifactError::Integrity {
                kind,
                path: path.to_path_buf(),
                reason,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| corrupt(kind, path, e.to_string()))
    }
}

fn corrupt(kind: ArtifactKind, path: &Path, reason: String) -> ArtifactError {
    ArtifactError::Corrupt {
        kind,
        path: path.to_path_buf(),
        reason,
    }
}

fn check_schema(
    kind: ArtifactKind,
    path: &Path,
    n_features: usize,
    names: Option<&[String]>,
) -> Result<(), ArtifactError> {
    if n_features != FEATURE_COUNT {
        return Err(corrupt(
            kind,
            path,
            format!("expected {FEATURE_COUNT} features, found {n_features}"),
        ));
    }

    match names {
        Some(names) => check_feature_names(names).map_err(|reason| corrupt(kind, path, reason)),
        None => {
            tracing::warn!(
                "{kind} artifact {} has no feature names; assuming schema order",
                path.display()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCALER_JSON: &str = r#"{
        "feature_names": ["年龄", "性别", "身高", "体重", "本次输血量", "HGB前"],
        "mean": [55.0, 0.5, 165.0, 62.0, 2.0, 85.0],
        "scale": [15.0, 0.5, 8.0, 12.0, 1.5, 15.0]
    }"#;

    const MODEL_JSON: &str = r#"{
        "kind": "linear",
        "feature_names": ["age", "gender", "height", "weight", "transfusion_units", "hgb_before"],
        "intercept": 100.0,
        "coefficients": [0.1, 1.0, 0.0, 0.5, 3.0, 10.0]
    }"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write artifact");
        path
    }

    #[test]
    fn test_load_both_artifacts() {
        let temp = tempdir().expect("tempdir");
        write(temp.path(), SCALER_FILE, SCALER_JSON);
        write(temp.path(), MODEL_FILE, MODEL_JSON);

        let loaded = ArtifactLoader::default().load(&ArtifactPaths::in_dir(temp.path()));
        assert!(loaded.is_ready());
        assert!(loaded.errors().is_empty());
    }

    #[test]
    fn test_missing_scaler_is_not_found_and_model_still_loads() {
        let temp = tempdir().expect("tempdir");
        write(temp.path(), MODEL_FILE, MODEL_JSON);

        let loaded = ArtifactLoader::default().load(&ArtifactPaths::in_dir(temp.path()));
        assert!(!loaded.is_ready());
        assert!(matches!(
            loaded.scaler,
            Err(ArtifactError::NotFound {
                kind: ArtifactKind::Scaler,
                ..
            })
        ));
        assert!(loaded.model.is_ok());
    }

    #[test]
    fn test_malformed_json_is_corrupt() {
        let temp = tempdir().expect("tempdir");
        let path = write(temp.path(), SCALER_FILE, "{ not json");

        let err = ArtifactLoader::default()
            .load_scaler(&path)
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_feature_order_mismatch_is_corrupt() {
        let temp = tempdir().expect("tempdir");
        let swapped = SCALER_JSON.replace(r#""年龄", "性别""#, r#""性别", "年龄""#);
        let path = write(temp.path(), SCALER_FILE, &swapped);

        let err = ArtifactLoader::default()
            .load_scaler(&path)
            .expect_err("must fail");
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
        assert!(err.to_string().contains("position 0"));
    }

    #[test]
    fn test_feature_count_mismatch_is_corrupt() {
        let temp = tempdir().expect("tempdir");
        let path = write(
            temp.path(),
            SCALER_FILE,
            r#"{"mean":[0.0,0.0,0.0,0.0,0.0],"scale":[1.0,1.0,1.0,1.0,1.0]}"#,
        );

        let err = ArtifactLoader::default()
            .load_scaler(&path)
            .expect_err("must fail");
        assert!(err.to_string().contains("expected 6 features, found 5"));
    }

    #[test]
    fn test_unnamed_artifact_is_accepted_positionally() {
        let temp = tempdir().expect("tempdir");
        let path = write(
            temp.path(),
            MODEL_FILE,
            r#"{"kind":"linear","intercept":0.0,"coefficients":[1.0,1.0,1.0,1.0,1.0,1.0]}"#,
        );
        assert!(ArtifactLoader::default().load_model(&path).is_ok());
    }

    #[test]
    fn test_tampered_artifact_fails_integrity() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        write(dir, SCALER_FILE, SCALER_JSON);
        let model = write(dir, MODEL_FILE, MODEL_JSON);

        let manifest = Manifest {
            version: integrity::MANIFEST_VERSION,
            created_at: None,
            nonce_b64: None,
            files: [
                (SCALER_FILE.to_string(), integrity::sha256_hex(SCALER_JSON.as_bytes())),
                (MODEL_FILE.to_string(), integrity::sha256_hex(b"something else")),
            ]
            .into_iter()
            .collect(),
        };
        fs::write(
            dir.join(integrity::MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize"),
        )
        .expect("write manifest");

        let loader = ArtifactLoader::default();
        let loaded = loader.load(&ArtifactPaths::in_dir(dir));
        assert!(loaded.scaler.is_ok());
        assert!(matches!(
            loaded.model,
            Err(ArtifactError::Integrity {
                kind: ArtifactKind::Model,
                ..
            })
        ));

        let off = ArtifactLoader::new(IntegrityVerifier::new(IntegrityPolicy::Off, None));
        assert!(off.load_model(&model).is_ok());
    }

    #[test]
    fn test_integrity_failure_marks_both() {
        let loaded = LoadedArtifacts::integrity_failure(&ArtifactPaths::default(), "bad key");
        assert_eq!(loaded.errors().len(), 2);
        assert!(loaded.errors()[1].to_string().contains("bad key"));
    }
}
