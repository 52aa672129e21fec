//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the fitted artifacts.

mod regressor;
mod scaler;

pub use regressor::{AttributionExplainer, Regressor};
pub use scaler::FeatureScaler;
