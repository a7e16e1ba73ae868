//! Coercion pipeline: transforms an incoming value before validation.

use super::{check_method_name, dedup_by, Target};
use crate::error::{ConfigurationError, Error, HandlerResult, Result};
use crate::input::Input;
use crate::instance::Instance;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type CoerceFn = dyn Fn(&Instance, Value) -> HandlerResult<Value> + Send + Sync;

/// One transformation step.
#[derive(Clone)]
pub enum Coercion {
    Function { label: String, call: Arc<CoerceFn> },
    /// Reference to a method of the owner, resolved when the step runs.
    Method(String),
}

impl Coercion {
    pub fn function<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, Value) -> HandlerResult<Value> + Send + Sync + 'static,
    {
        Coercion::Function {
            label: label.into(),
            call: Arc::new(f),
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Coercion::Method(name.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Coercion::Function { label, .. } => label,
            Coercion::Method(name) => name,
        }
    }

    fn same(&self, other: &Coercion) -> bool {
        match (self, other) {
            (Coercion::Function { call: a, .. }, Coercion::Function { call: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            (Coercion::Method(a), Coercion::Method(b)) => a == b,
            _ => false,
        }
    }

    fn call(&self, instance: &Instance, value: Value) -> HandlerResult<Value> {
        match self {
            Coercion::Function { call, .. } => call(instance, value),
            Coercion::Method(name) => instance.call(name, &[value]),
        }
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coercion::Function { label, .. } => f.debug_tuple("Function").field(label).finish(),
            Coercion::Method(name) => f.debug_tuple("Method").field(name).finish(),
        }
    }
}

/// Ordered list of coercions, folded left to right.
#[derive(Debug, Clone, Default)]
pub struct Coercer {
    handlers: Vec<Coercion>,
}

impl Coercer {
    pub fn new(handlers: impl IntoIterator<Item = Coercion>) -> std::result::Result<Self, ConfigurationError> {
        let handlers: Vec<Coercion> = handlers.into_iter().collect();
        for handler in &handlers {
            if let Coercion::Method(name) = handler {
                check_method_name(name)?;
            }
        }
        Ok(Self {
            handlers: dedup_by(handlers, Coercion::same),
        })
    }

    pub fn handlers(&self) -> &[Coercion] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Our handlers followed by `other`'s, de-duplicated.
    pub fn merge(&self, other: &Coercer) -> Coercer {
        let combined = self.handlers.iter().chain(&other.handlers).cloned().collect();
        Coercer {
            handlers: dedup_by(combined, Coercion::same),
        }
    }

    /// Run every step over `input`.
    ///
    /// The sentinel passes through untouched, and so does `nil` when the
    /// signature rejects it: coercion never turns an input the validator
    /// will refuse into one it accepts. The first failing step aborts the
    /// pipeline.
    pub fn apply(&self, target: Target<'_>, instance: &Instance, input: Input) -> Result<Input> {
        let mut value = match input {
            Input::Undefined => return Ok(Input::Undefined),
            Input::Value(Value::Null) if !target.signature.is_nilable() => {
                return Ok(Input::Value(Value::Null))
            }
            Input::Value(value) => value,
        };

        for handler in &self.handlers {
            tracing::trace!(attribute = %target, handler = handler.label(), "coercing");
            value = handler
                .call(instance, value)
                .map_err(|source| Error::Coercion {
                    owner: target.owner_name(),
                    attribute: target.attribute_name(),
                    handler: handler.label().to_string(),
                    source,
                })?;
        }

        Ok(Input::Value(value))
    }
}
