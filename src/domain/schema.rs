//! Feature schema shared by the input form, the scaler and the model.
//!
//! The trained artifacts consume features strictly by position. The order below is
//! the order they were fitted on; artifacts carrying feature names are checked
//! against it at load time.

/// How a field's raw value is entered and represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole numbers only
    Integer,
    /// 0/1 indicator
    Binary,
    /// Decimal values
    Continuous,
}

/// Descriptor of one model input field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    /// Stable identifier used in code and logs
    pub key: &'static str,
    /// Column label the artifacts were trained with
    pub column: &'static str,
    /// Display label
    pub label: &'static str,
    /// Display unit (empty for unitless fields)
    pub unit: &'static str,
    pub kind: FieldKind,
    /// Inclusive lower bound
    pub min: f64,
    /// Inclusive upper bound
    pub max: f64,
}

impl FieldDescriptor {
    /// Whether `value` is accepted for this field.
    #[must_use]
    pub fn accepts(&self, value: f64) -> bool {
        if !value.is_finite() || value < self.min || value > self.max {
            return false;
        }
        match self.kind {
            FieldKind::Integer => value.fract() == 0.0,
            FieldKind::Binary => value == 0.0 || value == 1.0,
            FieldKind::Continuous => true,
        }
    }

    /// Whether an artifact feature name refers to this field.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        name == self.column || name.eq_ignore_ascii_case(self.key)
    }
}

/// Number of model input features.
pub const FEATURE_COUNT: usize = 6;

pub const AGE: usize = 0;
pub const GENDER: usize = 1;
pub const HEIGHT: usize = 2;
pub const WEIGHT: usize = 3;
pub const TRANSFUSION_UNITS: usize = 4;
pub const HGB_BEFORE: usize = 5;

/// Model input fields, in trained order.
pub static FEATURE_SCHEMA: [FieldDescriptor; FEATURE_COUNT] = [
    FieldDescriptor {
        key: "age",
        column: "年龄",
        label: "Age",
        unit: "years",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 100.0,
    },
    FieldDescriptor {
        key: "gender",
        column: "性别",
        label: "Gender",
        unit: "",
        kind: FieldKind::Binary,
        min: 0.0,
        max: 1.0,
    },
    FieldDescriptor {
        key: "height",
        column: "身高",
        label: "Height",
        unit: "cm",
        kind: FieldKind::Continuous,
        min: 20.0,
        max: 250.0,
    },
    FieldDescriptor {
        key: "weight",
        column: "体重",
        label: "Weight",
        unit: "kg",
        kind: FieldKind::Continuous,
        min: 10.0,
        max: 200.0,
    },
    FieldDescriptor {
        key: "transfusion_units",
        column: "本次输血量",
        label: "Transfusion",
        unit: "U",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 12.0,
    },
    FieldDescriptor {
        key: "hgb_before",
        column: "HGB前",
        label: "Pre-transfusion HGB",
        unit: "g/L",
        kind: FieldKind::Integer,
        min: 20.0,
        max: 200.0,
    },
];

/// Check artifact feature names against the schema, position by position.
///
/// # Errors
/// Returns a description of the first mismatch (count or name at a position).
pub fn check_feature_names<S: AsRef<str>>(names: &[S]) -> Result<(), String> {
    if names.len() != FEATURE_COUNT {
        return Err(format!(
            "expected {} feature names, found {}",
            FEATURE_COUNT,
            names.len()
        ));
    }

    for (position, (name, field)) in names.iter().zip(FEATURE_SCHEMA.iter()).enumerate() {
        if !field.matches_name(name.as_ref()) {
            return Err(format!(
                "feature order mismatch at position {}: expected '{}' ({}), found '{}'",
                position,
                field.column,
                field.key,
                name.as_ref()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_indices_match_keys() {
        assert_eq!(FEATURE_SCHEMA[AGE].key, "age");
        assert_eq!(FEATURE_SCHEMA[GENDER].key, "gender");
        assert_eq!(FEATURE_SCHEMA[HEIGHT].key, "height");
        assert_eq!(FEATURE_SCHEMA[WEIGHT].key, "weight");
        assert_eq!(FEATURE_SCHEMA[TRANSFUSION_UNITS].key, "transfusion_units");
        assert_eq!(FEATURE_SCHEMA[HGB_BEFORE].key, "hgb_before");
    }

    #[test]
    fn test_accepts_boundaries() {
        for field in FEATURE_SCHEMA.iter() {
            assert!(field.accepts(field.min), "{} min", field.key);
            assert!(field.accepts(field.max), "{} max", field.key);
            assert!(!field.accepts(field.max + 1.0), "{} above max", field.key);
            assert!(!field.accepts(field.min - 1.0), "{} below min", field.key);
        }
        assert!(!FEATURE_SCHEMA[AGE].accepts(30.5));
        assert!(!FEATURE_SCHEMA[HEIGHT].accepts(f64::NAN));
        assert!(FEATURE_SCHEMA[HEIGHT].accepts(170.4));
    }

    #[test]
    fn test_check_feature_names_accepts_columns_and_keys() {
        let columns = ["年龄", "性别", "身高", "体重", "本次输血量", "HGB前"];
        assert!(check_feature_names(&columns).is_ok());

        let keys = ["age", "gender", "height", "weight", "transfusion_units", "hgb_before"];
        assert!(check_feature_names(&keys).is_ok());
    }

    #[test]
    fn test_check_feature_names_rejects_swapped_order() {
        let swapped = ["年龄", "性别", "体重", "身高", "本次输血量", "HGB前"];
        let err = check_feature_names(&swapped).expect_err("must reject");
        assert!(err.contains("position 2"));
    }

    #[test]
    fn test_check_feature_names_rejects_wrong_count() {
        let short = ["年龄", "性别"];
        let err = check_feature_names(&short).expect_err("must reject");
        assert!(err.contains("expected 6"));
    }
}
