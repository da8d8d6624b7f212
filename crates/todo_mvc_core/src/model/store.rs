//! Per-instance attribute store.
//!
//! # Responsibility
//! - Seed instance attributes from type defaults and overlay caller values.
//! - Provide read/write accessors over the live attribute mapping.
//! - Emit one diagnostic record per created store.
//!
//! # Invariants
//! - Every key present in the defaults is present in the store.
//! - Overrides are admitted as-is: unknown keys are added and value types
//!   are not checked against the defaults.
//! - `cid` is generated once and never reused for another store.

use crate::model::defaults::{AttributeDefaults, EntityDefaults};
use crate::model::value::AttributeValue;
use crate::model::Attributes;
use log::{debug, info};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use uuid::Uuid;

/// Client-side identifier of one store instance.
pub type StoreId = Uuid;

/// Store shared between its owner and any number of views.
pub type SharedStore = Rc<RefCell<AttributeStore>>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Keys seeded from defaults cannot be removed.
    DefaultKeyProtected { key: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DefaultKeyProtected { key } => {
                write!(f, "attribute `{key}` comes from defaults and cannot be unset")
            }
        }
    }
}

impl Error for StoreError {}

/// Attribute mapping for one entity instance.
///
/// Cloning copies the attributes into a new store with its own `cid`.
#[derive(Debug)]
pub struct AttributeStore {
    cid: StoreId,
    defaults: AttributeDefaults,
    attributes: Attributes,
}

impl AttributeStore {
    /// Creates a store equal to `defaults` overlaid with `overrides`.
    ///
    /// Never fails: override keys missing from the defaults are appended in
    /// override order, existing keys keep their default position.
    pub fn create(defaults: &AttributeDefaults, overrides: Attributes) -> Self {
        let mut attributes = defaults.values().clone();
        let mut extra_keys = 0usize;
        for (key, value) in overrides {
            if !defaults.contains_key(key.as_str()) {
                extra_keys += 1;
            }
            attributes.insert(key, value);
        }

        Self::register(defaults.clone(), attributes, extra_keys)
    }

    fn register(defaults: AttributeDefaults, attributes: Attributes, extra_keys: usize) -> Self {
        let store = Self {
            cid: Uuid::new_v4(),
            defaults,
            attributes,
        };

        info!(
            "event=store_created module=model entity={} cid={} extra_keys={} attributes={}",
            store.entity(),
            store.cid,
            extra_keys,
            store.to_json()
        );
        store
    }

    /// Builds a store from a strongly-typed defaults struct plus an open
    /// overlay map.
    pub fn build<D: EntityDefaults>(typed_defaults: &D, overrides: Attributes) -> Self {
        Self::create(&typed_defaults.to_defaults(), overrides)
    }

    /// Wraps this store for sharing with views.
    pub fn into_shared(self) -> SharedStore {
        Rc::new(RefCell::new(self))
    }

    pub fn cid(&self) -> StoreId {
        self.cid
    }

    pub fn entity(&self) -> &'static str {
        self.defaults.entity()
    }

    pub fn defaults(&self) -> &AttributeDefaults {
        &self.defaults
    }

    /// Returns the full current mapping.
    pub fn get_all(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Sets one attribute, adding it when absent.
    ///
    /// Returns `true` when the stored value changed. NaN over NaN is not a
    /// change.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> bool {
        let key = key.into();
        let value = value.into();
        if self
            .attributes
            .get(key.as_str())
            .is_some_and(|current| current.same_value(&value))
        {
            return false;
        }

        debug!(
            "event=store_set module=model cid={} key={} kind={}",
            self.cid,
            key,
            value.kind()
        );
        self.attributes.insert(key, value);
        true
    }

    /// Removes an attribute that did not come from the defaults.
    ///
    /// Returns the removed value, or `None` when the key was absent.
    ///
    /// # Errors
    /// - `StoreError::DefaultKeyProtected` when `key` is a default key.
    pub fn unset(&mut self, key: &str) -> StoreResult<Option<AttributeValue>> {
        if self.defaults.contains_key(key) {
            return Err(StoreError::DefaultKeyProtected {
                key: key.to_string(),
            });
        }
        Ok(self.attributes.shift_remove(key))
    }

    /// Restores default values and drops every extra key.
    pub fn reset_to_defaults(&mut self) {
        self.attributes = self.defaults.values().clone();
    }

    /// Keys that are not part of the defaults, in insertion order.
    pub fn extra_keys(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .keys()
            .map(String::as_str)
            .filter(|key| !self.defaults.contains_key(key))
    }

    /// Current mapping as a JSON object in attribute order.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.attributes
                .iter()
                .map(|(key, value)| (key.clone(), attribute_to_json(value)))
                .collect(),
        )
    }
}

impl Clone for AttributeStore {
    fn clone(&self) -> Self {
        let extra_keys = self.extra_keys().count();
        Self::register(self.defaults.clone(), self.attributes.clone(), extra_keys)
    }
}

fn attribute_to_json(value: &AttributeValue) -> serde_json::Value {
    match value {
        AttributeValue::Bool(flag) => serde_json::Value::Bool(*flag),
        AttributeValue::Text(text) => serde_json::Value::String(text.clone()),
        AttributeValue::Number(number) => serde_json::Number::from_f64(*number)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeStore, StoreError};
    use crate::model::defaults::AttributeDefaults;
    use crate::model::value::AttributeValue;
    use crate::model::Attributes;

    fn sample_defaults() -> AttributeDefaults {
        AttributeDefaults::new(
            "sample",
            [
                ("title", AttributeValue::from("")),
                ("completed", AttributeValue::from(false)),
            ],
        )
    }

    #[test]
    fn set_reports_whether_value_changed() {
        let mut store = AttributeStore::create(&sample_defaults(), Attributes::new());

        assert!(store.set("title", "write docs"));
        assert!(!store.set("title", "write docs"));
        assert!(store.set("priority", 2));
        assert_eq!(store.get("priority"), Some(&AttributeValue::from(2)));
    }

    #[test]
    fn unset_refuses_default_keys_but_removes_extras() {
        let mut overrides = Attributes::new();
        overrides.insert("cheese".to_string(), AttributeValue::from("cheddar"));
        let mut store = AttributeStore::create(&sample_defaults(), overrides);

        let err = store.unset("title").unwrap_err();
        assert_eq!(
            err,
            StoreError::DefaultKeyProtected {
                key: "title".to_string()
            }
        );
        assert!(store.has("title"));

        let removed = store.unset("cheese").unwrap();
        assert_eq!(removed, Some(AttributeValue::from("cheddar")));
        assert_eq!(store.unset("cheese").unwrap(), None);
    }

    #[test]
    fn reset_restores_defaults_and_drops_extras() {
        let mut store = AttributeStore::create(&sample_defaults(), Attributes::new());
        store.set("title", "changed");
        store.set("extra", true);

        store.reset_to_defaults();

        assert_eq!(store.get_all(), sample_defaults().values());
        assert_eq!(store.extra_keys().count(), 0);
    }

    #[test]
    fn to_json_keeps_attribute_order() {
        let mut overrides = Attributes::new();
        overrides.insert("cheese".to_string(), AttributeValue::from("cheddar"));
        let store = AttributeStore::create(&sample_defaults(), overrides);

        let rendered = store.to_json().to_string();
        assert_eq!(
            rendered,
            r#"{"title":"","completed":false,"cheese":"cheddar"}"#
        );
    }

    #[test]
    fn set_treats_nan_over_nan_as_unchanged() {
        let mut store = AttributeStore::create(&sample_defaults(), Attributes::new());

        assert!(store.set("ratio", f64::NAN));
        assert!(!store.set("ratio", f64::NAN));
        assert!(store.set("ratio", 0.5));
    }

    #[test]
    fn clone_copies_attributes_under_a_new_cid() {
        let mut overrides = Attributes::new();
        overrides.insert("cheese".to_string(), AttributeValue::from("cheddar"));
        let original = AttributeStore::create(&sample_defaults(), overrides);

        let mut copy = original.clone();

        assert_ne!(copy.cid(), original.cid());
        assert_eq!(copy.get_all(), original.get_all());
        assert_eq!(copy.extra_keys().collect::<Vec<_>>(), vec!["cheese"]);

        copy.set("title", "only the copy");
        assert_eq!(original.get("title"), Some(&AttributeValue::from("")));
        assert!(copy.unset("completed").is_err());
    }

    #[test]
    fn each_store_gets_a_distinct_cid() {
        let first = AttributeStore::create(&sample_defaults(), Attributes::new());
        let second = AttributeStore::create(&sample_defaults(), Attributes::new());

        assert!(!first.cid().is_nil());
        assert_ne!(first.cid(), second.cid());
    }
}
