//! Value codec - coerce raw edit input into the entry's type.
//!
//! | Type     | Accepts                                   | Failure        |
//! |----------|-------------------------------------------|----------------|
//! | `String` | anything, verbatim                        | none           |
//! | `Int`    | finite number with no fractional part     | `NotNumeric`, `NotInteger` |
//! | `Float`  | finite number                             | `NotNumeric`   |
//! | `Bool`   | `true`, `"true"`, `1`, `"1"` are true     | none (else false) |
//! | other    | nothing                                   | `UnknownType`  |
//!
//! Numeric input ignores surrounding whitespace. Empty input is not a number.

use std::fmt;

use serde_json::{Number, Value};

use crate::entry::{Entry, ValueType};
use crate::error::CoercionError;

/// A value whose shape is known to match its type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl TypedValue {
    /// The type tag this value satisfies.
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::String(_) => ValueType::String,
            TypedValue::Int(_) => ValueType::Int,
            TypedValue::Float(_) => ValueType::Float,
            TypedValue::Bool(_) => ValueType::Bool,
        }
    }

    /// The JSON primitive sent on the wire.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Int(i) => Value::from(*i),
            // Codec output is always finite; from_f64 only fails on NaN/inf.
            TypedValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            TypedValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Coerce edit text for `entry` into a typed value.
pub fn parse_edit(entry: &Entry, raw: &str) -> Result<TypedValue, CoercionError> {
    match &entry.value_type {
        ValueType::String => Ok(TypedValue::String(raw.to_string())),
        ValueType::Int => parse_int(raw).map(TypedValue::Int),
        ValueType::Float => parse_float(raw).map(TypedValue::Float),
        ValueType::Bool => Ok(TypedValue::Bool(matches!(raw, "true" | "1"))),
        ValueType::Unknown(name) => Err(CoercionError::UnknownType {
            type_name: name.clone(),
        }),
    }
}

/// Coerce an edit handed over as an arbitrary JSON value.
///
/// Strings go through [`parse_edit`]. Booleans and numbers are accepted
/// directly where the type allows it.
pub fn parse_edit_json(entry: &Entry, raw: &Value) -> Result<TypedValue, CoercionError> {
    match (&entry.value_type, raw) {
        (ValueType::Unknown(name), _) => Err(CoercionError::UnknownType {
            type_name: name.clone(),
        }),
        (_, Value::String(text)) => parse_edit(entry, text),
        (ValueType::String, other) => Ok(TypedValue::String(other.to_string())),
        (ValueType::Bool, other) => Ok(TypedValue::Bool(is_true_token(other))),
        (ValueType::Int, Value::Number(n)) => int_from_number(n),
        (ValueType::Float, Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(TypedValue::Float)
            .ok_or_else(|| CoercionError::NotNumeric { raw: n.to_string() }),
        (ValueType::Int | ValueType::Float, other) => Err(CoercionError::NotNumeric {
            raw: other.to_string(),
        }),
    }
}

fn is_true_token(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

fn parse_float(raw: &str) -> Result<f64, CoercionError> {
    let text = raw.trim();
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| CoercionError::NotNumeric {
            raw: raw.to_string(),
        })
}

fn parse_int(raw: &str) -> Result<i64, CoercionError> {
    if let Ok(i) = raw.trim().parse::<i64>() {
        return Ok(i);
    }
    let f = parse_float(raw)?;
    float_to_int(f).ok_or_else(|| CoercionError::NotInteger {
        raw: raw.to_string(),
    })
}

fn int_from_number(n: &Number) -> Result<TypedValue, CoercionError> {
    if let Some(i) = n.as_i64() {
        return Ok(TypedValue::Int(i));
    }
    let raw = n.to_string();
    let f = n
        .as_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| CoercionError::NotNumeric { raw: raw.clone() })?;
    float_to_int(f)
        .map(TypedValue::Int)
        .ok_or(CoercionError::NotInteger { raw })
}

fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f.fract() != 0.0 || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}
