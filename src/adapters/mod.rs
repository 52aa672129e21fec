//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifacts`: JSON artifact loading, schema and integrity checks
//! - `model`: tree ensemble and linear regressors with exact SHAP explainers
//! - `scaler`: standard scaler
//! - `sanitize`: redaction of clinical values in logs

pub mod artifacts;
pub mod model;
pub mod sanitize;
pub mod scaler;

pub use artifacts::{ArtifactError, ArtifactKind, ArtifactLoader, ArtifactPaths, LoadedArtifacts};
pub use model::RegressionModel;
pub use scaler::StandardScaler;
