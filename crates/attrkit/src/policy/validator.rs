//! Validation: decides whether a (coerced) value may be stored.
//!
//! Checks run in a fixed order:
//!
//! 1. Sentinel: accepted when the signature is optional, otherwise the value
//!    "is required".
//! 2. `nil`: accepted when the signature is nilable, otherwise it "cannot be
//!    nil". No handler runs for `nil`.
//! 3. Every handler, in declaration order. A handler that raises does not
//!    stop the others.
//!
//! After step 3, raised errors take precedence: any of them produces one
//! aggregate [`Error::Validation`] listing every failure in handler order.
//! Only when no handler raised does a `false` outcome produce the plain
//! [`Error::Rejected`] "has invalid value" error.

use super::{check_method_name, dedup_by, Matcher, Target};
use crate::error::{ConfigurationError, Error, HandlerFailure, HandlerResult, Result};
use crate::input::Input;
use crate::instance::Instance;
use crate::value::{inspect, is_truthy};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type CheckFn = dyn Fn(&Instance, &Value) -> HandlerResult<bool> + Send + Sync;

/// One validation handler.
#[derive(Clone)]
pub enum Check {
    Predicate { label: String, call: Arc<CheckFn> },
    /// Owner method called with the value; its result is taken for truthiness.
    Method(String),
    Matcher(Matcher),
}

impl Check {
    pub fn predicate<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, &Value) -> HandlerResult<bool> + Send + Sync + 'static,
    {
        Check::Predicate {
            label: label.into(),
            call: Arc::new(f),
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Check::Method(name.into())
    }

    pub fn matcher(matcher: impl Into<Matcher>) -> Self {
        Check::Matcher(matcher.into())
    }

    pub fn label(&self) -> String {
        match self {
            Check::Predicate { label, .. } => label.clone(),
            Check::Method(name) => name.clone(),
            Check::Matcher(matcher) => matcher.to_string(),
        }
    }

    fn same(&self, other: &Check) -> bool {
        match (self, other) {
            (Check::Predicate { call: a, .. }, Check::Predicate { call: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            (Check::Method(a), Check::Method(b)) => a == b,
            (Check::Matcher(a), Check::Matcher(b)) => a.same(b),
            _ => false,
        }
    }

    fn check(&self, instance: &Instance, value: &Value) -> HandlerResult<bool> {
        match self {
            Check::Predicate { call, .. } => call(instance, value),
            Check::Method(name) => instance
                .call(name, std::slice::from_ref(value))
                .map(|result| is_truthy(&result)),
            Check::Matcher(matcher) => Ok(matcher.matches(value)),
        }
    }
}

impl From<Matcher> for Check {
    fn from(matcher: Matcher) -> Self {
        Check::Matcher(matcher)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Predicate { label, .. } => f.debug_tuple("Predicate").field(label).finish(),
            Check::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Check::Matcher(matcher) => f.debug_tuple("Matcher").field(matcher).finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    handlers: Vec<Check>,
}

impl Validator {
    pub fn new(handlers: impl IntoIterator<Item = Check>) -> std::result::Result<Self, ConfigurationError> {
        let handlers: Vec<Check> = handlers.into_iter().collect();
        for handler in &handlers {
            if let Check::Method(name) = handler {
                check_method_name(name)?;
            }
        }
        Ok(Self {
            handlers: dedup_by(handlers, Check::same),
        })
    }

    pub fn handlers(&self) -> &[Check] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Our handlers followed by `other`'s, de-duplicated.
    pub fn merge(&self, other: &Validator) -> Validator {
        let combined = self.handlers.iter().chain(&other.handlers).cloned().collect();
        Validator {
            handlers: dedup_by(combined, Check::same),
        }
    }

    pub fn apply(&self, target: Target<'_>, instance: &Instance, input: &Input) -> Result<()> {
        let Some(value) = input.as_value() else {
            if target.signature.is_optional() {
                return Ok(());
            }
            return Err(reject(target, "is required".to_string()));
        };
        if value.is_null() {
            if target.signature.is_nilable() {
                return Ok(());
            }
            return Err(reject(target, "cannot be nil".to_string()));
        }

        let mut errors = Vec::new();
        let mut accepted = true;
        for handler in &self.handlers {
            tracing::trace!(attribute = %target, handler = %handler.label(), "validating");
            match handler.check(instance, value) {
                Ok(true) => {}
                Ok(false) => accepted = false,
                Err(source) => errors.push(HandlerFailure {
                    handler: handler.label(),
                    source,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(Error::Validation {
                owner: target.owner_name(),
                attribute: target.attribute_name(),
                errors,
            });
        }
        if !accepted {
            return Err(reject(
                target,
                format!("has invalid value: `{}`", inspect(value)),
            ));
        }
        Ok(())
    }
}

fn reject(target: Target<'_>, reason: String) -> Error {
    Error::Rejected {
        owner: target.owner_name(),
        attribute: target.attribute_name(),
        reason,
    }
}
