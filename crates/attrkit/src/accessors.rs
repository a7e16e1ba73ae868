//! Reader and writer access from outside an owner.
//!
//! [`Object`] pairs an instance with its [`TypeDef`] and plays the part of
//! generated accessors: [`Object::get`] and [`Object::set`] check the
//! attribute's read and write visibility, and only public accessors may be
//! used. Construction goes through the [`crate::initializer::Initializer`],
//! which assigns every attribute regardless of visibility.

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::registry::{Registry, TypeDef};
use crate::signature::{Signature, Visibility};
use serde_json::{Map, Value};

static NIL: Value = Value::Null;

#[derive(Debug, Clone)]
pub struct Object<'a> {
    type_def: &'a TypeDef,
    instance: Instance,
}

impl<'a> Object<'a> {
    /// Construct an instance of `type_name` with the registry's initializer.
    pub fn new(
        registry: &'a Registry,
        type_name: &str,
        positional: Vec<Value>,
        named: Map<String, Value>,
    ) -> Result<Self> {
        let initializer = registry.initializer(type_name)?;
        let instance = initializer.call(positional, named)?;
        Ok(Self {
            type_def: initializer.type_def(),
            instance,
        })
    }

    /// Wrap an instance that was built elsewhere.
    pub fn wrap(type_def: &'a TypeDef, instance: Instance) -> Self {
        Self { type_def, instance }
    }

    pub fn type_def(&self) -> &'a TypeDef {
        self.type_def
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn into_instance(self) -> Instance {
        self.instance
    }

    /// Public reader. Unassigned attributes read as `nil`.
    pub fn get(&self, name: &str) -> Result<&Value> {
        let visibility = self.signature_of(name)?.read_visibility();
        self.check(name.to_string(), visibility)?;
        Ok(self.instance.get(name).unwrap_or(&NIL))
    }

    /// Public writer: runs the attribute's full assignment pipeline.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let visibility = self.signature_of(name)?.write_visibility();
        self.check(format!("{name}="), visibility)?;
        self.type_def.assign(&mut self.instance, name, value.into())
    }

    fn signature_of(&self, name: &str) -> Result<&'a Signature> {
        self.type_def
            .attributes()
            .get(name)
            .map(|attr| attr.signature())
            .ok_or_else(|| Error::UnknownAttribute {
                owner: self.type_def.name().to_string(),
                name: name.to_string(),
            })
    }

    fn check(&self, method: String, visibility: Visibility) -> Result<()> {
        if visibility.is_restricted() {
            return Err(Error::Visibility {
                owner: self.type_def.name().to_string(),
                method,
                visibility,
            });
        }
        Ok(())
    }
}
