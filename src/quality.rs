//! Data-quality rule evaluation for lab payloads.
//!
//! This is the upstream collaborator that turns raw submission payloads into
//! quality-flag event types before they reach the analytics core. The core
//! itself only counts the resulting event types; payload interpretation
//! happens here.

use serde_json::{Map, Value};

/// Clinical fields every submission payload must carry.
pub const REQUIRED_LAB_FIELDS: [&str; 3] = ["hb", "wbc", "glucose"];

/// Expected clinical ranges, as (field, min, max).
pub const LAB_RANGES: [(&str, f64, f64); 3] = [
    ("hb", 9.0, 18.0),
    ("wbc", 3.0, 12.0),
    ("glucose", 60.0, 200.0),
];

/// A field whose value falls outside its expected clinical range.
///
/// `observed` is NaN when the value could not be coerced to a number; the
/// non-numeric value is itself a range violation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RangeViolation {
    /// The offending field name
    pub field: String,
    /// The observed value (NaN for non-numeric values)
    pub observed: f64,
    /// Lower bound of the expected range
    pub min: f64,
    /// Upper bound of the expected range
    pub max: f64,
}

fn as_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Returns the required lab fields that are absent or null in the payload.
pub fn missing_required_fields(payload: &Map<String, Value>) -> Vec<String> {
    REQUIRED_LAB_FIELDS
        .iter()
        .filter(|&&field| matches!(payload.get(field), None | Some(Value::Null)))
        .map(|&field| field.to_string())
        .collect()
}

/// Returns the fields whose values fall outside the expected clinical ranges.
///
/// # Behavior
/// - Absent or null fields are skipped (they are reported by
///   [`missing_required_fields`] instead)
/// - Numeric strings are coerced; any other non-numeric value is reported as
///   a violation with a NaN observed value
pub fn out_of_range_fields(payload: &Map<String, Value>) -> Vec<RangeViolation> {
    let mut issues = Vec::new();
    for (field, min, max) in LAB_RANGES {
        match payload.get(field) {
            None | Some(Value::Null) => continue,
            Some(value) => {
                let observed = as_number(value);
                if observed.is_nan() || observed < min || observed > max {
                    issues.push(RangeViolation {
                        field: field.to_string(),
                        observed,
                        min,
                        max,
                    });
                }
            }
        }
    }
    issues
}
