//! # Construction
//!
//! An [`Initializer`] builds an instance from positional and named inputs in
//! two phases:
//!
//! 1. **Positional**: inputs are matched to positional attributes in
//!    canonical order. Attributes past the end of the input receive the
//!    sentinel, so their defaults apply.
//! 2. **Named**: every named attribute receives its entry from the input map,
//!    or the sentinel when the key is absent.
//!
//! The positional input count is checked before anything is assigned: fewer
//! inputs than positional attributes without a default, or more inputs than
//! positional attributes, is an arity error.
//!
//! Every assignment goes through [`TypeDef::assign`], the same path later
//! mutation uses.

use crate::error::{Error, Result};
use crate::input::Input;
use crate::instance::Instance;
use crate::registry::TypeDef;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub struct Initializer<'a> {
    type_def: &'a TypeDef,
    strict_named: bool,
}

impl<'a> Initializer<'a> {
    pub fn new(type_def: &'a TypeDef) -> Self {
        Self {
            type_def,
            strict_named: false,
        }
    }

    /// Fail on named inputs that match no named attribute instead of
    /// ignoring them.
    pub fn strict_named(mut self, strict: bool) -> Self {
        self.strict_named = strict;
        self
    }

    pub fn type_def(&self) -> &'a TypeDef {
        self.type_def
    }

    /// Construct a new instance.
    pub fn call(&self, positional: Vec<Value>, named: Map<String, Value>) -> Result<Instance> {
        let mut instance = self.type_def.instance();
        self.apply(&mut instance, positional, named)?;
        tracing::debug!(owner = %self.type_def.name(), instance = %instance.id(), "constructed");
        Ok(instance)
    }

    /// Run both phases against an existing instance.
    pub fn apply(
        &self,
        instance: &mut Instance,
        positional: Vec<Value>,
        mut named: Map<String, Value>,
    ) -> Result<()> {
        let attributes = self.type_def.attributes();
        self.check_arity(positional.len())?;
        self.check_named(&named)?;

        let mut inputs = positional.into_iter();
        for attribute in attributes.positional() {
            let input = inputs.next().map_or(Input::Undefined, Input::Value);
            self.type_def.assign(instance, attribute.name(), input)?;
        }

        for attribute in attributes.named() {
            let input = named.remove(attribute.name()).map_or(Input::Undefined, Input::Value);
            self.type_def.assign(instance, attribute.name(), input)?;
        }

        Ok(())
    }

    fn check_arity(&self, given: usize) -> Result<()> {
        let attributes = self.type_def.attributes();
        let min = attributes.required_positional_count();
        let max = attributes.positional_count();
        if given < min || given > max {
            return Err(Error::Arity {
                owner: self.type_def.name().to_string(),
                given,
                min,
                max,
            });
        }
        Ok(())
    }

    fn check_named(&self, named: &Map<String, Value>) -> Result<()> {
        let attributes = self.type_def.attributes();
        let mut unknown: Vec<String> = named
            .keys()
            .filter(|key| {
                attributes
                    .get(key)
                    .map_or(true, |attr| !attr.signature().is_named())
            })
            .cloned()
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }

        unknown.sort();
        if self.strict_named {
            return Err(Error::UnknownKeys {
                owner: self.type_def.name().to_string(),
                keys: unknown,
            });
        }
        tracing::warn!(
            owner = %self.type_def.name(),
            keys = ?unknown,
            "ignoring unknown named inputs"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::DefaultValue;
    use crate::registry::Registry;
    use crate::signature::Kind;
    use serde_json::json;

    fn point_registry() -> Registry {
        let mut registry = Registry::new();
        registry.declare("Point").unwrap();
        for (name, kind) in [("x", Kind::Positional), ("y", Kind::Positional)] {
            let decl = registry.declaration("Point", name, kind).unwrap();
            registry.attribute("Point", decl).unwrap();
        }
        let z = registry
            .declaration("Point", "z", Kind::Positional)
            .unwrap()
            .default(DefaultValue::value(0));
        registry.attribute("Point", z).unwrap();
        let label = registry
            .declaration("Point", "label", Kind::Named)
            .unwrap()
            .default(DefaultValue::value("origin"));
        registry.attribute("Point", label).unwrap();
        registry
    }

    fn named(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_positional_then_named() {
        let registry = point_registry();
        let init = registry.initializer("Point").unwrap();
        let point = init
            .call(vec![json!(1), json!(2)], named(&[("label", json!("a"))]))
            .unwrap();
        assert_eq!(point.to_json(), json!({"x": 1, "y": 2, "z": 0, "label": "a"}));
    }

    #[test]
    fn test_absent_inputs_use_defaults() {
        let registry = point_registry();
        let point = registry
            .initializer("Point")
            .unwrap()
            .call(vec![json!(1), json!(2), json!(3)], Map::new())
            .unwrap();
        assert_eq!(point.get("z"), Some(&json!(3)));
        assert_eq!(point.get("label"), Some(&json!("origin")));
    }

    #[test]
    fn test_too_few_positional_inputs() {
        let registry = point_registry();
        let err = registry
            .initializer("Point")
            .unwrap()
            .call(vec![json!(1)], Map::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "wrong number of arguments for Point (given 1, expected 2..3)"
        );
    }

    #[test]
    fn test_too_many_positional_inputs() {
        let registry = point_registry();
        let err = registry
            .initializer("Point")
            .unwrap()
            .call(vec![json!(1), json!(2), json!(3), json!(4)], Map::new())
            .unwrap_err();
        assert!(matches!(err, Error::Arity { given: 4, min: 2, max: 3, .. }));
    }

    #[test]
    fn test_unknown_named_inputs_are_ignored_by_default() {
        let registry = point_registry();
        let point = registry
            .initializer("Point")
            .unwrap()
            .call(vec![json!(1), json!(2)], named(&[("colour", json!("red"))]))
            .unwrap();
        assert!(!point.is_assigned("colour"));
    }

    #[test]
    fn test_strict_mode_rejects_unknown_named_inputs() {
        let registry = point_registry();
        let err = registry
            .initializer("Point")
            .unwrap()
            .strict_named(true)
            .call(
                vec![json!(1), json!(2)],
                named(&[("x", json!(5)), ("colour", json!("red"))]),
            )
            .unwrap_err();
        match err {
            Error::UnknownKeys { owner, keys } => {
                assert_eq!(owner, "Point");
                assert_eq!(keys, vec!["colour", "x"]);
            }
            other => panic!("expected unknown keys, got {other:?}"),
        }
    }

    #[test]
    fn test_assignment_errors_stop_construction() {
        let mut registry = Registry::new();
        registry.declare("Login").unwrap();
        let user = registry
            .declaration("Login", "user", Kind::Named)
            .unwrap()
            .required(true);
        registry.attribute("Login", user).unwrap();

        let err = registry
            .initializer("Login")
            .unwrap()
            .call(Vec::new(), Map::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Login#user is required");
    }
}
