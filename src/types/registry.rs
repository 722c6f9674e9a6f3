//! Insertion-ordered variable registry

use crate::error::{AdapterError, Result};
use crate::types::variable::{InputVariable, OutputVariable};

/// A record addressable by its unique name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for InputVariable {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for OutputVariable {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Name-keyed collection that remembers insertion order.
///
/// The insertion order doubles as the default feature or output ordering of a
/// model adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRegistry<V> {
    entries: Vec<V>,
}

impl<V> Default for VariableRegistry<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V: Named> VariableRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate names.
    pub fn from_variables<I>(variables: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
    {
        let mut registry = Self::new();
        for variable in variables {
            registry.insert(variable)?;
        }
        Ok(registry)
    }

    /// Append a variable.
    pub fn insert(&mut self, variable: V) -> Result<()> {
        if self.contains(variable.name()) {
            return Err(AdapterError::DuplicateVariable(variable.name().to_string()));
        }
        self.entries.push(variable);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.iter().find(|v| v.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.entries.iter_mut().find(|v| v.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Named::name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, V> IntoIterator for &'a VariableRegistry<V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
