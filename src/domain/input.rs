//! Clinical input types for post-transfusion HGB prediction.

use serde::{Deserialize, Serialize};

use super::schema::{FEATURE_COUNT, FEATURE_SCHEMA};

/// Patient gender as collected by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Normalize a textual label into a gender.
    ///
    /// Accepts `男` / `女` as used in the form, plus `male`/`m` and `female`/`f`
    /// (ASCII case-insensitive). Unknown labels are rejected rather than mapped to
    /// a default.
    ///
    /// # Errors
    /// Returns the offending label when it is not recognized.
    pub fn from_label(label: &str) -> Result<Self, String> {
        let trimmed = label.trim();
        match trimmed {
            "男" => return Ok(Self::Male),
            "女" => return Ok(Self::Female),
            _ => {}
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(format!("Unknown gender label '{trimmed}'")),
        }
    }

    /// Binary indicator the model was trained on (1 = male, 0 = female).
    #[must_use]
    pub fn indicator(self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }

    /// Form label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "男",
            Self::Female => "女",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "男 (male)"),
            Self::Female => write!(f, "女 (female)"),
        }
    }
}

/// The six raw clinical values of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    /// Age in years (0-100)
    pub age: u32,

    pub gender: Gender,

    /// Height in cm (20-250)
    pub height_cm: f64,

    /// Weight in kg (10-200)
    pub weight_kg: f64,

    /// Red cell units transfused in this episode (0-12, 1U = concentrate from 200 ml whole blood)
    pub transfusion_units: u32,

    /// Pre-transfusion hemoglobin in g/L (20-200)
    pub hgb_before: u32,
}

impl Default for ClinicalInput {
    fn default() -> Self {
        Self {
            age: 30,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 70.0,
            transfusion_units: 0,
            hgb_before: 120,
        }
    }
}

impl ClinicalInput {
    /// Assemble the model feature vector in schema order.
    #[must_use]
    pub fn to_feature_vector(&self) -> FeatureVector {
        FeatureVector::new([
            f64::from(self.age),
            self.gender.indicator(),
            self.height_cm,
            self.weight_kg,
            f64::from(self.transfusion_units),
            f64::from(self.hgb_before),
        ])
    }

    /// Validate every field against the schema ranges.
    ///
    /// # Errors
    /// Returns all violations, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .to_feature_vector()
            .iter()
            .filter(|(field, value)| !field.accepts(*value))
            .map(|(field, value)| {
                format!(
                    "{} {} out of range [{}, {}]",
                    field.label, value, field.min, field.max
                )
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Raw (unscaled) model input in schema order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Pair each value with its field descriptor.
    pub fn iter(&self) -> impl Iterator<Item = (&'static super::FieldDescriptor, f64)> + '_ {
        FEATURE_SCHEMA.iter().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{GENDER, HEIGHT, HGB_BEFORE};

    #[test]
    fn test_gender_labels() {
        assert_eq!(Gender::from_label("男"), Ok(Gender::Male));
        assert_eq!(Gender::from_label("女"), Ok(Gender::Female));
        assert_eq!(Gender::from_label(" Male "), Ok(Gender::Male));
        assert_eq!(Gender::from_label("F"), Ok(Gender::Female));
        assert!(Gender::from_label("unknown").is_err());
        assert_eq!(Gender::Male.indicator(), 1.0);
        assert_eq!(Gender::Female.indicator(), 0.0);
    }

    #[test]
    fn test_feature_vector_order() {
        let input = ClinicalInput::default();
        let vector = input.to_feature_vector();

        assert_eq!(vector.as_slice(), &[30.0, 1.0, 170.0, 70.0, 0.0, 120.0]);
        assert_eq!(vector.get(GENDER), Some(1.0));
        assert_eq!(vector.get(HEIGHT), Some(170.0));
        assert_eq!(vector.get(HGB_BEFORE), Some(120.0));
    }

    #[test]
    fn test_validation() {
        assert!(ClinicalInput::default().validate().is_ok());

        let invalid = ClinicalInput {
            age: 101,
            height_cm: 19.9,
            transfusion_units: 13,
            ..Default::default()
        };
        let errors = invalid.validate().expect_err("must be invalid");
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("Age"));
    }

    #[test]
    fn test_validation_boundaries() {
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
        assert!(low.validate().is_ok());
        assert!(high.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_finite() {
        let input = ClinicalInput {
            weight_kg: f64::INFINITY,
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
