use serde::{Deserialize, Serialize};
use std::fmt;

/// A coerced cell value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int32(i32),
    Int(i64),
    Float32(f32),
    Float(f64),
    String(String),
    Boolean(bool),
    StringArray(Vec<String>),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(*v as i64),
            Value::Int(v) => Some(*v),
            Value::String(v) => v.parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Plain JSON form, used when handing a row to serde-based decoders.
    /// Non-finite floats have no JSON representation and map to `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int32(v) => serde_json::Value::from(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            // Widening keeps the f32's binary error, so go through its shortest
            // decimal form instead.
            Value::Float32(v) => v
                .to_string()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::StringArray(v) => serde_json::Value::Array(
                v.iter().cloned().map(serde_json::Value::String).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::StringArray(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}
