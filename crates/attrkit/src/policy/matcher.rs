//! Pattern-matchable validator handlers.
//!
//! A [`Matcher`] is a value that answers "does this input match me?"
//! without running user code: a type tag, a literal, a set of literals, a
//! numeric range or a regular expression.

use crate::error::ConfigurationError;
use crate::value::{inspect, ValueKind};
use regex::Regex;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches values of a type tag.
    Kind(ValueKind),
    /// Matches exactly one value.
    Equals(Value),
    /// Matches any of the listed values.
    OneOf(Vec<Value>),
    /// Matches numbers within inclusive bounds; `None` leaves a side open.
    Range { min: Option<f64>, max: Option<f64> },
    /// Matches strings containing a match of the expression.
    Pattern(Regex),
}

impl Matcher {
    /// Compile a regular expression matcher.
    pub fn pattern(expr: &str) -> Result<Self, ConfigurationError> {
        Regex::new(expr)
            .map(Matcher::Pattern)
            .map_err(|e| ConfigurationError::InvalidPattern {
                pattern: expr.to_string(),
                message: e.to_string(),
            })
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Matcher::Range { min, max }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Kind(kind) => kind.matches(value),
            Matcher::Equals(expected) => expected == value,
            Matcher::OneOf(options) => options.contains(value),
            Matcher::Range { min, max } => value.as_f64().is_some_and(|n| {
                min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
            }),
            Matcher::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
        }
    }

    /// Structural identity, used to de-duplicate handler lists.
    pub(crate) fn same(&self, other: &Matcher) -> bool {
        match (self, other) {
            (Matcher::Kind(a), Matcher::Kind(b)) => a == b,
            (Matcher::Equals(a), Matcher::Equals(b)) => a == b,
            (Matcher::OneOf(a), Matcher::OneOf(b)) => a == b,
            (Matcher::Range { min: a0, max: a1 }, Matcher::Range { min: b0, max: b1 }) => {
                a0 == b0 && a1 == b1
            }
            (Matcher::Pattern(a), Matcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<ValueKind> for Matcher {
    fn from(kind: ValueKind) -> Self {
        Matcher::Kind(kind)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Kind(kind) => write!(f, "{}", kind),
            Matcher::Equals(value) => write!(f, "== {}", inspect(value)),
            Matcher::OneOf(values) => {
                let listed: Vec<String> = values.iter().map(inspect).collect();
                write!(f, "one of [{}]", listed.join(", "))
            }
            Matcher::Range { min, max } => {
                let lo = min.map(|n| n.to_string()).unwrap_or_default();
                let hi = max.map(|n| n.to_string()).unwrap_or_default();
                write!(f, "{}..{}", lo, hi)
            }
            Matcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}
