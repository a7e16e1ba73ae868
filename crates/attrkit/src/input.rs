//! The "not supplied" sentinel.
//!
//! Every value entering the pipeline is an [`Input`]: either a concrete
//! [`serde_json::Value`] (which includes `null`, the explicit nil) or
//! [`Input::Undefined`], meaning the caller supplied nothing at all. The two
//! are never equal, so "omitted" and "explicitly nil" stay distinguishable
//! through defaults, coercion and validation.

use crate::value::inspect;
use serde_json::Value;
use std::fmt;

/// A value handed to an attribute, or the absence of one.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Input {
    /// Nothing was supplied.
    #[default]
    Undefined,
    /// A concrete value, possibly `null`.
    Value(Value),
}

/// The sentinel. `Input::Undefined` is a unit variant, so every copy of it is
/// the same marker.
pub const UNDEFINED: Input = Input::Undefined;

impl Input {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Input::Undefined)
    }

    /// True only for an explicitly supplied `null`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Input::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Input::Undefined => None,
            Input::Value(value) => Some(value),
        }
    }

    /// Converts to a storable value; the sentinel is stored as `null`.
    pub fn into_value(self) -> Value {
        match self {
            Input::Undefined => Value::Null,
            Input::Value(value) => value,
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<Option<Value>> for Input {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Input::Undefined, Input::Value)
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Undefined => write!(f, "Undefined"),
            Input::Value(value) => write!(f, "{}", inspect(value)),
        }
    }
}
