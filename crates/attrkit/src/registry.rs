//! # Type Registry
//!
//! Attribute sets are not hidden state attached to types: a [`Registry`]
//! maps each declared owner to its [`TypeDef`] and is passed explicitly to
//! whatever constructs instances.
//!
//! ## Inheritance
//!
//! [`Registry::subclass`] copies the parent's attribute set once, at
//! declaration time, rebinding every attribute to the new owner. The two sets
//! are independent from then on: attributes declared later on the parent do
//! not reach existing subclasses, and redeclaring an inherited attribute on
//! the subclass merges with the inherited copy only.
//!
//! Methods are different: a subtype's [`MethodTable`] falls back to its
//! parent's live table, so a method defined on the parent later is still
//! found from the subtype and its instances.
//!
//! ```
//! use attrkit::registry::Registry;
//! use attrkit::signature::Kind;
//!
//! let mut registry = Registry::new();
//! registry.declare("User").unwrap();
//! let email = registry.declaration("User", "email", Kind::Named).unwrap();
//! registry.attribute("User", email).unwrap();
//!
//! registry.subclass("Admin", "User").unwrap();
//! let level = registry.declaration("Admin", "level", Kind::Named).unwrap();
//! registry.attribute("Admin", level).unwrap();
//!
//! let admin = registry.get("Admin").unwrap();
//! assert_eq!(admin.attributes().names(), vec!["email", "level"]);
//! assert_eq!(registry.get("User").unwrap().attributes().names(), vec!["email"]);
//! ```

use crate::attribute::Declaration;
use crate::config::AttrkitConfig;
use crate::error::{ConfigurationError, Error, HandlerResult, Result};
use crate::initializer::Initializer;
use crate::input::Input;
use crate::instance::Instance;
use crate::owner::{MethodTable, TypeName};
use crate::policy::check_method_name;
use crate::set::AttributeSet;
use crate::signature::Kind;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;

static DEFAULT_CONFIG: Lazy<AttrkitConfig> = Lazy::new(AttrkitConfig::default);

/// Everything the engine knows about one owner type.
#[derive(Debug)]
pub struct TypeDef {
    name: TypeName,
    parent: Option<TypeName>,
    methods: MethodTable,
    attributes: AttributeSet,
}

impl TypeDef {
    fn new(name: TypeName) -> Self {
        Self {
            attributes: AttributeSet::new(name.clone()),
            name,
            parent: None,
            methods: MethodTable::new(),
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn parent(&self) -> Option<&TypeName> {
        self.parent.as_ref()
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// A fresh, empty instance of this type.
    pub fn instance(&self) -> Instance {
        Instance::new(self.name.clone(), self.methods.clone())
    }

    /// Assign `input` to the named attribute through its full pipeline.
    ///
    /// This is the one write path: constructors and later mutation both end
    /// up here.
    pub fn assign(&self, instance: &mut Instance, name: &str, input: impl Into<Input>) -> Result<()> {
        let attribute = self
            .attributes
            .get(name)
            .ok_or_else(|| Error::UnknownAttribute {
                owner: self.name.to_string(),
                name: name.to_string(),
            })?;
        attribute.apply(instance, input.into())
    }
}

/// Owner types by name, plus the configuration their declarations use.
#[derive(Debug)]
pub struct Registry {
    config: AttrkitConfig,
    types: HashMap<String, TypeDef>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CONFIG.clone())
    }

    pub fn with_config(config: AttrkitConfig) -> Self {
        Self {
            config,
            types: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AttrkitConfig {
        &self.config
    }

    /// Declare a new owner type with no attributes.
    pub fn declare(&mut self, name: &str) -> Result<&mut TypeDef> {
        let type_name = self.fresh_name(name)?;
        tracing::debug!(owner = %type_name, "declared type");
        Ok(self
            .types
            .entry(name.to_string())
            .or_insert_with(|| TypeDef::new(type_name)))
    }

    /// Declare `name` as a subtype of `parent`, inheriting a rebound copy of
    /// its attributes and a view of its methods.
    pub fn subclass(&mut self, name: &str, parent: &str) -> Result<&mut TypeDef> {
        let type_name = self.fresh_name(name)?;
        let parent_def = self.lookup(parent)?;
        let child = TypeDef {
            attributes: parent_def.attributes.duplicate_with_owner(&type_name),
            methods: MethodTable::inherit(&parent_def.methods),
            parent: Some(parent_def.name.clone()),
            name: type_name,
        };
        tracing::debug!(owner = %child.name, parent = %parent_def.name, "declared subtype");
        Ok(self.types.entry(name.to_string()).or_insert(child))
    }

    /// Register a method on a type. Existing instances and subtypes see it.
    pub fn define_method<F>(&mut self, type_name: &str, method: &str, f: F) -> Result<()>
    where
        F: Fn(&Instance, &[Value]) -> HandlerResult<Value> + Send + Sync + 'static,
    {
        check_method_name(method).map_err(|source| Error::configuration(type_name, source))?;
        let type_def = self.lookup_mut(type_name)?;
        type_def.methods.define(method, f);
        Ok(())
    }

    /// Start a declaration for `type_name` carrying this registry's defaults.
    pub fn declaration(&self, type_name: &str, name: &str, kind: Kind) -> Result<Declaration> {
        let type_def = self.lookup(type_name)?;
        Ok(Declaration::new(type_def.name.as_str(), name, kind)
            .defaults(self.config.signature_defaults()?))
    }

    /// Build the declared attribute and add it to the type's set.
    pub fn attribute(&mut self, type_name: &str, declaration: Declaration) -> Result<()> {
        let attribute = declaration.build()?;
        self.lookup_mut(type_name)?.attributes.add(attribute)
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeDef> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Declared type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// A constructor for `type_name`, configured from this registry.
    pub fn initializer(&self, type_name: &str) -> Result<Initializer<'_>> {
        Ok(Initializer::new(self.lookup(type_name)?).strict_named(self.config.strict_named))
    }

    fn fresh_name(&self, name: &str) -> Result<TypeName> {
        let type_name = TypeName::parse(name).map_err(|source| {
            Error::configuration(
                name,
                ConfigurationError::InvalidOwner {
                    value: name.to_string(),
                    source,
                },
            )
        })?;
        if self.types.contains_key(name) {
            return Err(Error::configuration(
                name,
                ConfigurationError::DuplicateType(name.to_string()),
            ));
        }
        Ok(type_name)
    }

    fn lookup(&self, name: &str) -> Result<&TypeDef> {
        self.types
            .get(name)
            .ok_or_else(|| Error::configuration(name, ConfigurationError::UnknownType(name.to_string())))
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut TypeDef> {
        self.types
            .get_mut(name)
            .ok_or_else(|| Error::configuration(name, ConfigurationError::UnknownType(name.to_string())))
    }
}
