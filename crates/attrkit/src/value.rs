//! Value type tags and helpers.
//!
//! Attribute values are plain [`serde_json::Value`]s. This module gives them
//! the small amount of typing the pipeline needs: a [`ValueKind`] tag that
//! validators can match against, a truthiness rule for method-based checks,
//! and the textual representation used in rejection messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Type tag for a value.
///
/// `Number` is a wider tag that matches both `Integer` and `Float`; every
/// other tag matches exactly one JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Nil,
    Bool,
    Integer,
    Float,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// The most specific tag for a value. Never returns `Number`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Check whether `value` belongs to this tag.
    pub fn matches(&self, value: &Value) -> bool {
        let actual = ValueKind::of(value);
        match self {
            ValueKind::Number => matches!(actual, ValueKind::Integer | ValueKind::Float),
            tag => *tag == actual,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Check if a value counts as "true" for method-based checks.
///
/// - `null` and `false`: false
/// - everything else (including `0`, `""` and empty collections): true
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Textual representation of a value for error messages.
///
/// `null` renders as `nil`; everything else renders as compact JSON, so
/// strings keep their quotes.
pub fn inspect(value: &Value) -> String {
    match value {
        Value::Null => "nil".to_string(),
        other => other.to_string(),
    }
}
