//! Change callbacks: observers notified after a value is committed.

use super::{dedup_by, Target};
use crate::error::{Error, HandlerFailure, HandlerResult, Result};
use crate::instance::Instance;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type ObserveFn = dyn Fn(&Instance, &Value, &Value) -> HandlerResult<()> + Send + Sync;

/// Receives `(instance, old, new)` after every successful assignment.
#[derive(Clone)]
pub struct Observer {
    label: String,
    call: Arc<ObserveFn>,
}

impl Observer {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, &Value, &Value) -> HandlerResult<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            call: Arc::new(f),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn same(&self, other: &Observer) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observer").field(&self.label).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Callback {
    handlers: Vec<Observer>,
}

impl Callback {
    pub fn new(handlers: impl IntoIterator<Item = Observer>) -> Self {
        Self {
            handlers: dedup_by(handlers.into_iter().collect(), Observer::same),
        }
    }

    pub fn handlers(&self) -> &[Observer] {
        &self.handlers
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Our handlers followed by `other`'s, de-duplicated.
    pub fn merge(&self, other: &Callback) -> Callback {
        Callback::new(self.handlers.iter().chain(&other.handlers).cloned())
    }

    /// Notify every observer. A failing observer never stops the rest; all
    /// failures are reported together once every observer has run.
    pub fn apply(&self, target: Target<'_>, instance: &Instance, old: &Value, new: &Value) -> Result<()> {
        let errors: Vec<HandlerFailure> = self
            .handlers
            .iter()
            .filter_map(|handler| {
                tracing::trace!(attribute = %target, handler = handler.label(), "notifying");
                (handler.call)(instance, old, new)
                    .err()
                    .map(|source| HandlerFailure {
                        handler: handler.label.clone(),
                        source,
                    })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Callback {
                owner: target.owner_name(),
                attribute: target.attribute_name(),
                errors,
            })
        }
    }
}
