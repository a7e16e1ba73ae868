//! # Assignment Policies
//!
//! Each attribute owns three handler pipelines, applied in this order by
//! [`crate::attribute::Attribute::apply`]:
//!
//! | Policy | Handlers | Failure mode |
//! |--------|----------|--------------|
//! | [`Coercer`] | [`Coercion`] (function or owner method) | fail-fast: first error aborts |
//! | [`Validator`] | [`Check`] (predicate, owner method or [`Matcher`]) | every handler runs; raised errors aggregate |
//! | [`Callback`] | [`Observer`] | every handler runs; raised errors aggregate |
//!
//! Handlers never hold a reference back to their attribute. Each application
//! receives a [`Target`] naming the owner, the attribute and its signature,
//! which is what makes duplicating an attribute under a new owner a plain
//! clone.
//!
//! ## Handler identity
//!
//! Handler lists are de-duplicated on construction and after merging,
//! keeping the first occurrence:
//! - function handlers are the same when they share one allocation
//!   (`Arc::ptr_eq`)
//! - method references are the same when they name the same method
//! - matchers are the same when they are structurally equal

mod callback;
mod coercer;
mod matcher;
mod validator;

pub use callback::{Callback, Observer};
pub use coercer::{Coercer, Coercion};
pub use matcher::Matcher;
pub use validator::{Check, Validator};

use crate::error::ConfigurationError;
use crate::owner::{is_method_name, TypeName};
use crate::signature::Signature;
use std::fmt;

/// The attribute a policy is being applied for.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub owner: &'a TypeName,
    pub name: &'a str,
    pub signature: &'a Signature,
}

impl<'a> Target<'a> {
    pub fn new(owner: &'a TypeName, name: &'a str, signature: &'a Signature) -> Self {
        Self {
            owner,
            name,
            signature,
        }
    }

    pub(crate) fn owner_name(&self) -> String {
        self.owner.to_string()
    }

    pub(crate) fn attribute_name(&self) -> String {
        self.name.to_string()
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.name)
    }
}

/// Keep the first of every group of identical handlers, preserving order.
pub(crate) fn dedup_by<T>(items: Vec<T>, same: impl Fn(&T, &T) -> bool) -> Vec<T> {
    let mut unique: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.iter().any(|kept| same(kept, &item)) {
            unique.push(item);
        }
    }
    unique
}

pub(crate) fn check_method_name(name: &str) -> Result<(), ConfigurationError> {
    if is_method_name(name) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidMethod(name.to_string()))
    }
}
