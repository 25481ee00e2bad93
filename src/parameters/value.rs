//! Typed parameter values
//!
//! Every leaf of a parameter tree declares a [`ValueKind`] when it is built and
//! only ever holds [`Value`]s of that kind. The [`ParamType`] trait links the
//! kinds to plain Rust types so leaves can be declared and read with ordinary
//! types (`Entry::new::<f64>(..)`, `tree.get::<f64>("a.b")`).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// The declared type of a leaf parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Str,
    FloatArray,
}

impl ValueKind {
    /// Whether values of this kind can be packed into an optimizer vector
    /// as a single number.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Float | ValueKind::Int)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Float => "Float",
            ValueKind::Int => "Int",
            ValueKind::Bool => "Bool",
            ValueKind::Str => "Str",
            ValueKind::FloatArray => "FloatArray",
        };
        f.write_str(name)
    }
}

/// A concrete parameter value.
///
/// Serializes as the bare value (`1.5`, `"auto"`, `[1.0, 2.0]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    FloatArray(Vec<f64>),
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Str(_) => ValueKind::Str,
            Value::FloatArray(_) => ValueKind::FloatArray,
        }
    }

    /// Numeric view of a scalar value, `None` for non-numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Converts this value so that it can be stored in a leaf of `kind`.
    ///
    /// Accepts an exact kind match and the lossless widening of `Int` into
    /// `Float`. Non-finite floats are rejected because they cannot be written
    /// to either text format.
    pub fn conform(self, kind: ValueKind) -> Result<Value, String> {
        let value = match (self, kind) {
            (Value::Int(i), ValueKind::Float) => Value::Float(i as f64),
            (v, k) if v.kind() == k => v,
            (v, k) => return Err(format!("expected {k}, got {} ({v})", v.kind())),
        };
        match &value {
            Value::Float(x) if !x.is_finite() => Err(format!("non-finite value {x}")),
            Value::FloatArray(xs) if xs.iter().any(|x| !x.is_finite()) => {
                Err("array contains non-finite values".to_string())
            }
            _ => Ok(value),
        }
    }

    /// Mapping representation of the value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Int(i) => JsonValue::from(*i),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::FloatArray(xs) => JsonValue::Array(
                xs.iter()
                    .map(|x| {
                        serde_json::Number::from_f64(*x)
                            .map(JsonValue::Number)
                            .unwrap_or(JsonValue::Null)
                    })
                    .collect(),
            ),
        }
    }

    /// Reads a mapping value as a value of `kind`.
    ///
    /// `null` is not handled here; callers treat it as "unset".
    pub fn from_json(json: &JsonValue, kind: ValueKind) -> Result<Value, String> {
        let value = match (kind, json) {
            (ValueKind::Float, JsonValue::Number(n)) => n.as_f64().map(Value::Float),
            (ValueKind::Int, JsonValue::Number(n)) => n.as_i64().map(Value::Int),
            (ValueKind::Bool, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
            (ValueKind::Str, JsonValue::String(s)) => Some(Value::Str(s.clone())),
            (ValueKind::FloatArray, JsonValue::Array(items)) => items
                .iter()
                .map(|item| item.as_f64())
                .collect::<Option<Vec<f64>>>()
                .map(Value::FloatArray),
            _ => None,
        };
        value.ok_or_else(|| format!("expected {kind}, got {json}"))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(x) => write!(f, "{x}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::FloatArray(xs) => write!(f, "{xs:?}"),
        }
    }
}

/// Rust types that can be stored in a leaf parameter.
pub trait ParamType: Sized {
    /// The kind a leaf declared with this type holds.
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl ParamType for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl ParamType for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl ParamType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl ParamType for String {
    const KIND: ValueKind = ValueKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl ParamType for Vec<f64> {
    const KIND: ValueKind = ValueKind::FloatArray;

    fn into_value(self) -> Value {
        Value::FloatArray(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::FloatArray(xs) => Some(xs.clone()),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<f64>> for Value {
    fn from(xs: Vec<f64>) -> Self {
        Value::FloatArray(xs)
    }
}
