//! Owner types: identity and method lookup.
//!
//! Valid type names:
//! - One or more segments separated by `::`
//! - Each segment starts with an uppercase ASCII letter
//! - The rest of a segment is ASCII alphanumerics or underscores

use crate::error::{HandlerError, HandlerResult};
use crate::instance::Instance;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use thiserror::Error;

/// Identity of an owner type (e.g. `User`, `Billing::Invoice`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Validates a type name according to the owner naming rules.
    ///
    /// # Examples
    /// ```
    /// use attrkit::owner::TypeName;
    ///
    /// assert!(TypeName::parse("User").is_ok());
    /// assert!(TypeName::parse("Billing::Invoice2").is_ok());
    ///
    /// assert!(TypeName::parse("").is_err());
    /// assert!(TypeName::parse("user").is_err());
    /// assert!(TypeName::parse("Billing::").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, TypeNameError> {
        if name.is_empty() {
            return Err(TypeNameError::Empty);
        }

        for segment in name.split("::") {
            let Some(first_char) = segment.chars().next() else {
                return Err(TypeNameError::EmptySegment);
            };
            if !first_char.is_ascii_uppercase() {
                return Err(TypeNameError::InvalidStart(first_char));
            }
            if let Some(ch) = segment.chars().find(|ch| !is_valid_name_char(*ch)) {
                return Err(TypeNameError::InvalidCharacter(ch));
            }
        }

        Ok(TypeName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

impl FromStr for TypeName {
    type Err = TypeNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeName::parse(s)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for type name validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeNameError {
    #[error("type name cannot be empty")]
    Empty,
    #[error("type name cannot contain an empty segment")]
    EmptySegment,
    #[error("type name segments must start with an uppercase letter, found '{0}'")]
    InvalidStart(char),
    #[error("type name contains invalid character '{0}' (only alphanumeric and underscore allowed)")]
    InvalidCharacter(char),
}

/// A named behavior of an owner type, callable with an instance as context.
pub type Method = Arc<dyn Fn(&Instance, &[Value]) -> HandlerResult<Value> + Send + Sync>;

/// Owner-provided method lookup. Method references in coercers and validators
/// resolve against this table when they run, not when they are declared.
///
/// Clones share one table: a method defined through any clone is visible to
/// every holder, including instances created before the definition. A table
/// made with [`MethodTable::inherit`] falls back to its parent's live table
/// for names it does not define itself.
#[derive(Clone, Default)]
pub struct MethodTable {
    inner: Arc<RwLock<Methods>>,
}

#[derive(Default)]
struct Methods {
    own: HashMap<String, Method>,
    parent: Option<MethodTable>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table that resolves missing names through `parent`.
    pub fn inherit(parent: &MethodTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Methods {
                own: HashMap::new(),
                parent: Some(parent.clone()),
            })),
        }
    }

    /// Register (or replace) a method.
    pub fn define<F>(&self, name: impl Into<String>, method: F)
    where
        F: Fn(&Instance, &[Value]) -> HandlerResult<Value> + Send + Sync + 'static,
    {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .own
            .insert(name.into(), Arc::new(method));
    }

    /// Look a method up here, then along the parent chain.
    pub fn get(&self, name: &str) -> Option<Method> {
        let methods = self.read();
        match methods.own.get(name) {
            Some(method) => Some(method.clone()),
            None => methods.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every resolvable method name, inherited ones included, sorted.
    pub fn names(&self) -> Vec<String> {
        let methods = self.read();
        let mut names: Vec<String> = methods.own.keys().cloned().collect();
        if let Some(parent) = &methods.parent {
            names.extend(parent.names());
        }
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Invoke a method, failing like any other handler when it is missing.
    pub fn call(&self, instance: &Instance, name: &str, args: &[Value]) -> HandlerResult<Value> {
        // resolved before the call so no lock is held while it runs
        let method = self.get(name).ok_or_else(|| {
            HandlerError::new(format!(
                "undefined method `{}` for {}",
                name,
                instance.owner()
            ))
        })?;
        method(instance, args)
    }

    fn read(&self) -> RwLockReadGuard<'_, Methods> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.names())
            .finish()
    }
}

/// Checks if `name` can reference a method: an ASCII identifier that does not
/// start with a digit, optionally ending in `?` or `!`.
pub(crate) fn is_method_name(name: &str) -> bool {
    let body = name
        .strip_suffix('?')
        .or_else(|| name.strip_suffix('!'))
        .unwrap_or(name);
    let mut chars = body.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}
