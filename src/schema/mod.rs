//! Canonical feature schema shared by training and inference.
//!
//! Every payload that reaches the classifier goes through [`validate`]; the
//! resulting [`FeatureVector`] is the only way to obtain values in training
//! column order. Training and serving resolving field order anywhere else is a
//! correctness bug.

mod fields;

pub use fields::{FEATURE_COUNT, FEATURES, FieldKind, FieldSpec};

use std::collections::BTreeMap;

use thiserror::Error;

/// Rejections raised while validating a request payload or dataset row.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// A schema field is absent from the payload.
    #[error("Missing field '{0}'")]
    MissingField(&'static str),
    /// The payload carries a field the schema does not know.
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    /// A categorical field received a non-integer value.
    #[error("Field '{field}' expects an integer code, got {value}")]
    NonIntegralCode {
        /// Offending field name.
        field: &'static str,
        /// Value as received.
        value: f64,
    },
    /// A categorical field received a code outside its enumerated set.
    #[error("Field '{field}' has no code {code}")]
    UnknownCode {
        /// Offending field name.
        field: &'static str,
        /// Code as received.
        code: i64,
    },
    /// A numeric field fell outside its documented closed range.
    #[error("Field '{field}' value {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Offending field name.
        field: &'static str,
        /// Value as received.
        value: f64,
        /// Lower bound, inclusive.
        min: f64,
        /// Upper bound, inclusive.
        max: f64,
    },
}

/// Validated feature values in training column order.
///
/// Instances only exist for payloads that passed [`validate`], so downstream
/// code can index [`values`](Self::values) without re-checking domains.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Values in schema order, ready for the classifier.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a value by field name.
    pub fn get(&self, name: &str) -> Option<f64> {
        field_index(name).map(|idx| self.values[idx])
    }
}

/// Ordered field names; this is the persisted training column order.
pub fn order() -> Vec<String> {
    FEATURES.iter().map(|spec| spec.name.to_string()).collect()
}

/// Position of a field in the schema order.
pub fn field_index(name: &str) -> Option<usize> {
    FEATURES.iter().position(|spec| spec.name == name)
}

/// Validate a named payload against the schema.
///
/// Missing fields are reported before unknown ones so a caller that trimmed
/// its payload sees the actionable error first. Boundary values of numeric
/// ranges are accepted.
pub fn validate(payload: &BTreeMap<String, f64>) -> Result<FeatureVector, SchemaError> {
    let mut values = [0.0f64; FEATURE_COUNT];
    for (idx, spec) in FEATURES.iter().enumerate() {
        let value = *payload
            .get(spec.name)
            .ok_or(SchemaError::MissingField(spec.name))?;
        check_domain(spec, value)?;
        values[idx] = value;
    }
    for key in payload.keys() {
        if field_index(key).is_none() {
            return Err(SchemaError::UnknownField(key.clone()));
        }
    }
    Ok(FeatureVector { values })
}

fn check_domain(spec: &FieldSpec, value: f64) -> Result<(), SchemaError> {
    match spec.kind {
        FieldKind::Categorical(codes) => {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(SchemaError::NonIntegralCode {
                    field: spec.name,
                    value,
                });
            }
            let code = value as i64;
            if !codes.contains(&code) {
                return Err(SchemaError::UnknownCode {
                    field: spec.name,
                    code,
                });
            }
            Ok(())
        }
        FieldKind::Numeric { min, max } => {
            if value >= min && value <= max {
                Ok(())
            } else {
                Err(SchemaError::OutOfRange {
                    field: spec.name,
                    value,
                    min,
                    max,
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Payload with every field set to a boundary-valid value.
    pub(crate) fn valid_payload() -> BTreeMap<String, f64> {
        let mut payload = BTreeMap::new();
        for spec in FEATURES.iter() {
            let value = match spec.kind {
                FieldKind::Categorical(codes) => codes[0] as f64,
                FieldKind::Numeric { min, .. } => min,
            };
            payload.insert(spec.name.to_string(), value);
        }
        payload
    }

    #[test]
    fn order_is_stable_and_complete() {
        let names = order();
        assert_eq!(names.len(), FEATURE_COUNT);
        assert_eq!(names[0], "marital_status");
        assert_eq!(names[names.len() - 1], "gdp");
    }

    #[test]
    fn accepts_boundary_values() {
        let mut payload = valid_payload();
        payload.insert("unemployment_rate".into(), 16.2);
        payload.insert("gdp".into(), -4.06);
        payload.insert("admission_grade".into(), 200.0);
        let vector = validate(&payload).unwrap();
        assert_eq!(vector.get("unemployment_rate"), Some(16.2));
        assert_eq!(vector.get("gdp"), Some(-4.06));
    }

    #[test]
    fn rejects_missing_gdp() {
        let mut payload = valid_payload();
        payload.remove("gdp");
        assert_eq!(
            validate(&payload).unwrap_err(),
            SchemaError::MissingField("gdp")
        );
    }

    #[test]
    fn rejects_unknown_field() {
        let mut payload = valid_payload();
        payload.insert("attendance_rate".into(), 0.5);
        assert_eq!(
            validate(&payload).unwrap_err(),
            SchemaError::UnknownField("attendance_rate".into())
        );
    }

    #[test]
    fn rejects_unknown_categorical_code() {
        let mut payload = valid_payload();
        payload.insert("marital_status".into(), 7.0);
        assert_eq!(
            validate(&payload).unwrap_err(),
            SchemaError::UnknownCode {
                field: "marital_status",
                code: 7,
            }
        );
    }

    #[test]
    fn rejects_fractional_categorical_code() {
        let mut payload = valid_payload();
        payload.insert("debtor".into(), 0.5);
        assert!(matches!(
            validate(&payload).unwrap_err(),
            SchemaError::NonIntegralCode { field: "debtor", .. }
        ));
    }

    #[test]
    fn rejects_out_of_range_numeric() {
        let mut payload = valid_payload();
        payload.insert("unemployment_rate".into(), 16.3);
        assert!(matches!(
            validate(&payload).unwrap_err(),
            SchemaError::OutOfRange {
                field: "unemployment_rate",
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan_numeric() {
        let mut payload = valid_payload();
        payload.insert("gdp".into(), f64::NAN);
        assert!(matches!(
            validate(&payload).unwrap_err(),
            SchemaError::OutOfRange { field: "gdp", .. }
        ));
    }

    #[test]
    fn vector_preserves_schema_order() {
        let payload = valid_payload();
        let vector = validate(&payload).unwrap();
        for (idx, spec) in FEATURES.iter().enumerate() {
            assert_eq!(vector.values()[idx], payload[spec.name]);
        }
    }
}
