//! Instances: the in-memory value store an attribute writes into.
//!
//! An [`Instance`] knows its owner type and the owner's [`MethodTable`], so
//! handlers that receive it as their first argument can read sibling values
//! and resolve method references. Values are only ever written through
//! [`crate::attribute::Attribute::apply`].
//!
//! The id names one object. Cloning an instance yields a new object with the
//! same values and a fresh id.

use crate::error::HandlerResult;
use crate::owner::{MethodTable, TypeName};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug)]
pub struct Instance {
    id: Uuid,
    owner: TypeName,
    methods: MethodTable,
    values: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new(owner: TypeName, methods: MethodTable) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            methods,
            values: BTreeMap::new(),
        }
    }

    /// An instance of an owner without methods.
    pub fn bare(owner: TypeName) -> Self {
        Self::new(owner, MethodTable::new())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &TypeName {
        &self.owner
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// The stored value of an attribute, if it was ever assigned.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_assigned(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Assigned attribute names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Snapshot of every assigned value as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Call one of the owner's methods with this instance as context.
    pub fn call(&self, method: &str, args: &[Value]) -> HandlerResult<Value> {
        self.methods.call(self, method, args)
    }

    pub(crate) fn store(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.insert(name.to_string(), value)
    }
}

impl Clone for Instance {
    fn clone(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: self.owner.clone(),
            methods: self.methods.clone(),
            values: self.values.clone(),
        }
    }
}
