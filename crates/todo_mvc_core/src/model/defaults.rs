//! Per-type attribute defaults.
//!
//! # Responsibility
//! - Hold the fallback attribute mapping of one entity type.
//! - Bridge strongly-typed default structs into the open attribute mapping.
//!
//! # Invariants
//! - Defaults are read-only after construction; there is no mutating API.
//! - Key order follows declaration order.

use crate::model::value::AttributeValue;
use crate::model::Attributes;

/// Immutable default mapping for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefaults {
    entity: &'static str,
    values: Attributes,
}

impl AttributeDefaults {
    /// Defines defaults for `entity` from `(name, value)` pairs.
    ///
    /// A repeated name keeps its first position and its last value.
    pub fn new<K, V>(entity: &'static str, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        Self {
            entity,
            values: values
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Entity type name these defaults belong to, e.g. `todo`.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn values(&self) -> &Attributes {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Strongly-typed base defaults for one entity type.
///
/// Implementors are plain structs whose fields are the default attributes;
/// the open overlay map is applied on top by
/// [`AttributeStore::build`](crate::model::store::AttributeStore::build).
pub trait EntityDefaults {
    /// Entity type name used in diagnostics.
    const ENTITY: &'static str;

    /// Default attributes in declaration order.
    fn attributes(&self) -> Attributes;

    fn to_defaults(&self) -> AttributeDefaults {
        AttributeDefaults {
            entity: Self::ENTITY,
            values: self.attributes(),
        }
    }
}
