//! Namespaced properties attached to definitions, instances, and
//! constraints.
//!
//! Properties with the same (namespace, name) key are grouped; each group
//! keeps its distinct values in declaration order.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Namespace applied to properties that do not declare one.
pub const DEFAULT_PROPERTY_NAMESPACE: &str = "http://csrc.nist.gov/ns/oscal/metaschema/1.0";

/// A property as written in a module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawProperty {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub value: String,
}

/// Grouping key of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey {
    pub namespace: String,
    pub name: String,
}

impl PropertyKey {
    /// Key in the default property namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_namespace(DEFAULT_PROPERTY_NAMESPACE, name)
    }

    pub fn with_namespace(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Grouped property values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<PropertyKey, Vec<String>>,
}

impl Properties {
    /// Group raw properties by key, dropping repeated values.
    pub fn from_raw(raw: &[RawProperty]) -> Self {
        let mut entries: BTreeMap<PropertyKey, Vec<String>> = BTreeMap::new();
        for prop in raw {
            let key = match &prop.namespace {
                Some(ns) => PropertyKey::with_namespace(ns.as_str(), prop.name.as_str()),
                None => PropertyKey::new(prop.name.as_str()),
            };
            let values = entries.entry(key).or_default();
            if !values.contains(&prop.value) {
                values.push(prop.value.clone());
            }
        }
        Self { entries }
    }

    /// Values recorded under `key`, in declaration order.
    pub fn values(&self, key: &PropertyKey) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &PropertyKey, value: &str) -> bool {
        self.values(key).iter().any(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &[String])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, ns: Option<&str>, value: &str) -> RawProperty {
        RawProperty {
            name: name.into(),
            namespace: ns.map(Into::into),
            value: value.into(),
        }
    }

    #[test]
    fn test_groups_values_by_key_in_order() {
        let props = Properties::from_raw(&[
            prop("status", None, "draft"),
            prop("status", None, "final"),
            prop("status", None, "draft"),
            prop("status", Some("urn:x"), "other"),
        ]);
        assert_eq!(props.len(), 2);
        assert_eq!(props.values(&PropertyKey::new("status")), ["draft", "final"]);
        assert!(props.contains(&PropertyKey::with_namespace("urn:x", "status"), "other"));
    }

    #[test]
    fn test_missing_key_yields_no_values() {
        let props = Properties::from_raw(&[]);
        assert!(props.is_empty());
        assert!(props.values(&PropertyKey::new("x")).is_empty());
    }
}
