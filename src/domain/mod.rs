//! Domain layer: Core types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! The feature schema is the single source of truth for field order and ranges.

mod explanation;
mod input;
mod prediction;
pub mod schema;

pub use explanation::{Explanation, FeatureContribution, WaterfallRow};
pub use input::{ClinicalInput, FeatureVector, Gender};
pub use prediction::{reference, HgbPrediction};
pub use schema::{FieldDescriptor, FieldKind, FEATURE_COUNT, FEATURE_SCHEMA};
