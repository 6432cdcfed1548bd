//! Request Validation
//!
//! Parses a raw request body into a [`PatientInput`]. Types are checked
//! leniently: numeric strings are coerced, integral floats and booleans are
//! accepted for integer fields. Values are not range-checked.

use crate::error::{FieldError, RiskError, RiskResult};
use crate::features::PatientInput;
use serde_json::{Map, Value};

const NOT_A_FLOAT: &str = "value is not a valid float";
const NOT_AN_INTEGER: &str = "value is not a valid integer";
const REQUIRED: &str = "field required";

/// Largest magnitude at which every integral f64 is exact
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Parse and validate a JSON request body
pub fn parse_patient(body: &[u8]) -> RiskResult<PatientInput> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RiskError::invalid_field("body", format!("invalid JSON: {e}")))?;
    validate_patient(&value)
}

/// Validate an already-decoded JSON value
pub fn validate_patient(value: &Value) -> RiskResult<PatientInput> {
    let obj = value
        .as_object()
        .ok_or_else(|| RiskError::invalid_field("body", "expected a JSON object"))?;

    let mut reader = FieldReader::new(obj);
    let input = PatientInput {
        age: reader.float("age"),
        bmi: reader.float("bmi"),
        weight: reader.float("weight"),
        height: reader.float("height"),
        systolic_bp: reader.float("systolic_bp"),
        family_history: reader.integer("family_history"),
        physical_activity: reader.integer("physical_activity"),
        diet_quality: reader.float("diet_quality"),
        location: reader.integer("location"),
        smoking: reader.integer("smoking"),
    };
    reader.finish()?;
    Ok(input)
}

/// Reads typed fields and collects every failure.
/// Values returned after a failure are placeholders; `finish` rejects them.
struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn new(obj: &'a Map<String, Value>) -> Self {
        Self { obj, errors: Vec::new() }
    }

    fn float(&mut self, field: &str) -> f64 {
        self.read(field, coerce_float).unwrap_or(f64::NAN)
    }

    fn integer(&mut self, field: &str) -> i64 {
        self.read(field, coerce_integer).unwrap_or_default()
    }

    fn read<T>(&mut self, field: &str, coerce: fn(&Value) -> Result<T, &'static str>) -> Option<T> {
        let result = match self.obj.get(field) {
            None => Err(REQUIRED),
            Some(value) => coerce(value),
        };
        match result {
            Ok(v) => Some(v),
            Err(message) => {
                self.errors.push(FieldError::new(field, message));
                None
            }
        }
    }

    fn finish(self) -> RiskResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(RiskError::Validation(self.errors))
        }
    }
}

fn coerce_float(value: &Value) -> Result<f64, &'static str> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).ok_or(NOT_A_FLOAT),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(NOT_A_FLOAT),
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        _ => Err(NOT_A_FLOAT),
    }
}

fn coerce_integer(value: &Value) -> Result<i64, &'static str> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER)
                .map(|f| f as i64)
                .ok_or(NOT_AN_INTEGER),
        },
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| NOT_AN_INTEGER),
        _ => Err(NOT_AN_INTEGER),
    }
}
