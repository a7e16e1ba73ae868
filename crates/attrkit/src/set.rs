//! # Attribute sets
//!
//! An [`AttributeSet`] holds the attributes of one owner type, keyed by name
//! and kept in canonical order:
//!
//! 1. positional attributes without a default
//! 2. positional attributes with a default
//! 3. named attributes
//!
//! Within each group attributes keep the order they were first declared in.
//! The order is recomputed after every [`AttributeSet::add`], so it does not
//! depend on the order declarations arrive in.
//!
//! Every attribute in a set belongs to the set's owner. Adding an attribute
//! declared against another owner stores a rebound duplicate, and adding a
//! name that is already present stores the merge of both declarations.

use crate::attribute::Attribute;
use crate::error::Result;
use crate::owner::TypeName;

#[derive(Debug, Clone)]
pub struct AttributeSet {
    owner: TypeName,
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new(owner: TypeName) -> Self {
        Self {
            owner,
            attributes: Vec::new(),
        }
    }

    pub fn owner(&self) -> &TypeName {
        &self.owner
    }

    /// Add an attribute, merging with an existing one of the same name.
    pub fn add(&mut self, attribute: Attribute) -> Result<()> {
        match self.position_of(attribute.name()) {
            Some(index) => {
                let merged = self.attributes[index].merge(&attribute)?;
                tracing::debug!(owner = %self.owner, attribute = merged.name(), "merged attribute");
                let merged = self.bind(merged);
                self.attributes[index] = merged;
            }
            None => {
                let attribute = self.bind(attribute);
                self.attributes.push(attribute);
            }
        }
        self.reorder();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    /// Attribute names in canonical order.
    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(Attribute::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Positional attributes in canonical order.
    pub fn positional(&self) -> impl Iterator<Item = &Attribute> {
        self.iter().filter(|attr| attr.signature().is_positional())
    }

    pub fn named(&self) -> impl Iterator<Item = &Attribute> {
        self.iter().filter(|attr| attr.signature().is_named())
    }

    /// Number of positional inputs a constructor cannot do without.
    pub fn required_positional_count(&self) -> usize {
        self.positional().filter(|attr| !attr.has_default()).count()
    }

    pub fn positional_count(&self) -> usize {
        self.positional().count()
    }

    /// An independent copy owned by `owner`, every attribute rebound.
    pub fn duplicate_with_owner(&self, owner: &TypeName) -> AttributeSet {
        AttributeSet {
            owner: owner.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|attr| attr.duplicate_with_owner(owner))
                .collect(),
        }
    }

    /// A new set with the attributes `keep` accepts.
    pub fn select(&self, keep: impl Fn(&Attribute) -> bool) -> AttributeSet {
        AttributeSet {
            owner: self.owner.clone(),
            attributes: self.iter().filter(|attr| keep(attr)).cloned().collect(),
        }
    }

    /// A new set without the attributes `drop` accepts.
    pub fn reject(&self, drop: impl Fn(&Attribute) -> bool) -> AttributeSet {
        self.select(|attr| !drop(attr))
    }

    /// A new set without the named attributes. Unknown names are ignored.
    pub fn except(&self, names: &[&str]) -> AttributeSet {
        self.reject(|attr| names.contains(&attr.name()))
    }

    /// A new set holding ours and `other`'s attributes, added in that order.
    ///
    /// Shared names merge with `other`'s declaration winning; the result
    /// belongs to our owner.
    pub fn merge(&self, other: &AttributeSet) -> Result<AttributeSet> {
        let mut merged = self.clone();
        for attribute in other.iter() {
            merged.add(attribute.clone())?;
        }
        Ok(merged)
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name() == name)
    }

    fn bind(&self, attribute: Attribute) -> Attribute {
        if attribute.owner() == &self.owner {
            attribute
        } else {
            tracing::debug!(
                attribute = attribute.name(),
                from = %attribute.owner(),
                to = %self.owner,
                "rebinding attribute"
            );
            attribute.duplicate_with_owner(&self.owner)
        }
    }

    fn reorder(&mut self) {
        // stable: declaration order survives within each rank
        self.attributes.sort_by_key(rank);
    }
}

fn rank(attribute: &Attribute) -> u8 {
    let signature = attribute.signature();
    match (signature.is_positional(), attribute.has_default()) {
        (true, false) => 0,
        (true, true) => 1,
        (false, _) => 2,
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}
