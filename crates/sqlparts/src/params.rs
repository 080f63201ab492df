//! Parameter storage for query builders.

use crate::value::{ParamKey, ParamType, Value};
use std::collections::HashMap;

/// Insertion-ordered map of bound parameter values.
///
/// Re-binding an existing key replaces the value in place; the key keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(ParamKey, Value)>,
}

impl ParameterSet {
    /// Create a new empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `key`.
    pub fn insert(&mut self, key: ParamKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a bound value.
    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &ParamKey) -> bool {
        self.get(key).is_some()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Clear all parameters.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Into<ParamKey>, V: Into<Value>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (k, v) in iter {
            set.insert(k.into(), v.into());
        }
        set
    }
}

/// Declared types for bound parameters; absent keys are [`ParamType::Str`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTypeSet {
    types: HashMap<ParamKey, ParamType>,
}

impl ParameterTypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ParamKey, ty: ParamType) {
        self.types.insert(key, ty);
    }

    /// Declared type of `key`, defaulting to string.
    pub fn get(&self, key: &ParamKey) -> ParamType {
        self.types.get(key).copied().unwrap_or_default()
    }

    /// Whether a type was declared explicitly for `key`.
    pub fn is_declared(&self, key: &ParamKey) -> bool {
        self.types.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<K: Into<ParamKey>> FromIterator<(K, ParamType)> for ParameterTypeSet {
    fn from_iter<I: IntoIterator<Item = (K, ParamType)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }
    }
}
