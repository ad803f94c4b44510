//! # Abstract Type Maps
//!
//! A [`TypeMap`] translates the abstract type names declared in a schema
//! (`string`, `integer`, `object`, `boolean`) into a target-domain type. The
//! validator maps them to runtime value kinds, the DDL generator to column
//! keywords. Each consumer owns one immutable default map and accepts an
//! alternate map per walker.

use indexmap::IndexMap;

use crate::error::SchemaError;

/// The four abstract types every default map covers.
pub const ABSTRACT_TYPES: [&str; 4] = ["string", "integer", "object", "boolean"];

/// Immutable lookup from abstract type name to target type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMap<T> {
    entries: IndexMap<String, T>,
}

impl<T> TypeMap<T> {
    /// Build a map from `(abstract name, target)` pairs.
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Resolve `type_name`, failing with `UnknownType` when the map has no
    /// entry. `path` only labels the error.
    pub fn resolve(&self, type_name: &str, path: &str) -> Result<&T, SchemaError> {
        self.entries
            .get(type_name)
            .ok_or_else(|| SchemaError::unknown_type(type_name, path))
    }

    /// Whether the map knows `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<T: Clone> TypeMap<T> {
    /// A copy of this map with `overrides` replacing or adding entries.
    pub fn with_overrides<I, K>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        let mut entries = self.entries.clone();
        for (name, target) in overrides {
            entries.insert(name.into(), target);
        }
        Self { entries }
    }
}
