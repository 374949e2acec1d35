//! JSON values as seen by the importers.
//!
//! `JsonValue` is a closed tagged union so the tree importer can dispatch
//! with a single `match` instead of inspecting runtime types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar that can be stored directly as a node or relationship property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(i)
    }
}

impl From<f64> for Literal {
    fn from(x: f64) -> Self {
        Literal::Float(x)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Literal(Literal),
    /// Entries in document order.
    Object(Vec<(String, JsonValue)>),
    Array(Vec<JsonValue>),
}

impl JsonValue {
    pub fn parse(text: &str) -> serde_json::Result<JsonValue> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Ok(JsonValue::from(value))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsonValue::Object(_))
    }

    /// Short name of the variant, for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Literal(_) => "literal",
            JsonValue::Object(_) => "object",
            JsonValue::Array(_) => "array",
        }
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => JsonValue::Null,
            serde_json::Value::Bool(b) => JsonValue::Literal(Literal::Bool(b)),
            serde_json::Value::Number(n) => JsonValue::Literal(number_to_literal(&n)),
            serde_json::Value::String(s) => JsonValue::Literal(Literal::String(s)),
            serde_json::Value::Array(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            serde_json::Value::Object(map) => JsonValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, JsonValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Integers outside the i64 range fall back to floating point.
fn number_to_literal(n: &serde_json::Number) -> Literal {
    match n.as_i64() {
        Some(i) => Literal::Int(i),
        None => Literal::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}
