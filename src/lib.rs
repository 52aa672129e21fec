//! # Hemocast
//!
//! Post-transfusion hemoglobin (HGB) prediction with per-feature attribution.
//!
//! This crate provides:
//! - Loading of a fitted scaler and regression model from JSON artifacts
//! - A synchronous prediction pipeline over six clinical inputs
//! - Additive feature attribution (TreeSHAP / linear SHAP) with a waterfall chart
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (feature schema, clinical input, prediction, explanation)
//! - `ports`: Trait definitions for the scaler, the regressor and its explainer
//! - `adapters`: Concrete implementations (JSON artifacts, tree ensembles, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{ClinicalInput, Explanation, Gender, HgbPrediction};

/// Result type for Hemocast operations
pub type Result<T> = std::result::Result<T, HgbError>;

/// Main error type for Hemocast
#[derive(Debug, thiserror::Error)]
pub enum HgbError {
    #[error(transparent)]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Scaler not loaded")]
    ScalerNotLoaded,

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Feature transform failed: {0}")]
    Transform(String),

    #[error("Explanation failed: {0}")]
    Explainer(String),

    #[error("Invalid clinical input: {0}")]
    Validation(String),
}
