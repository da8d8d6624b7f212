//! Attribute model primitives shared by every entity type.
//!
//! # Responsibility
//! - Define the value shape stored per attribute.
//! - Define per-type defaults and per-instance attribute stores.
//!
//! # Invariants
//! - Defaults are immutable once defined for an entity type.
//! - Keys seeded from defaults are never removed from a store.

pub mod defaults;
pub mod store;
pub mod value;

use indexmap::IndexMap;

/// Ordered attribute mapping (insertion order is preserved).
///
/// Equality is order-independent, so two mappings with the same key/value
/// content compare equal regardless of how they were built.
pub type Attributes = IndexMap<String, value::AttributeValue>;

/// Collects `(name, value)` pairs into an [`Attributes`] mapping.
pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Attributes
where
    K: Into<String>,
    V: Into<value::AttributeValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}
