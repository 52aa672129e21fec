//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use case of the application: assess one submission.

mod assessment;
mod explanation;
mod prediction;

pub use assessment::{Assessment, AssessmentService};
pub use explanation::{ExplanationService, ADDITIVITY_TOLERANCE, MAX_DISPLAY};
pub use prediction::{PredictionOutcome, PredictionService};
