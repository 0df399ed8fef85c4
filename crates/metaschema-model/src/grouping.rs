//! Grouping of repeatable instances in JSON and XML.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::raw::RawGroupAs;

/// How a repeatable instance is represented in JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonGroupAs {
    /// Always an array.
    #[serde(rename = "ARRAY")]
    List,
    /// A single object when there is one item, else an array.
    #[default]
    #[serde(rename = "SINGLETON_OR_ARRAY")]
    SingletonOrList,
    /// An object keyed by each item's JSON-key flag.
    #[serde(rename = "BY_KEY")]
    Keyed,
}

impl JsonGroupAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "ARRAY",
            Self::SingletonOrList => "SINGLETON_OR_ARRAY",
            Self::Keyed => "BY_KEY",
        }
    }
}

impl fmt::Display for JsonGroupAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether repeated items are wrapped in a grouping element in XML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum XmlGroupAs {
    Grouped,
    #[default]
    Ungrouped,
}

impl XmlGroupAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grouped => "GROUPED",
            Self::Ungrouped => "UNGROUPED",
        }
    }
}

impl fmt::Display for XmlGroupAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved grouping of an instance. Instances without a `group-as` have no
/// group name and use the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupAs {
    pub name: Option<String>,
    pub in_json: JsonGroupAs,
    pub in_xml: XmlGroupAs,
}

impl GroupAs {
    pub fn from_raw(raw: Option<&RawGroupAs>) -> Self {
        match raw {
            Some(g) => Self {
                name: Some(g.name.clone()),
                in_json: g.in_json.unwrap_or_default(),
                in_xml: g.in_xml.unwrap_or_default(),
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let g = GroupAs::from_raw(None);
        assert!(g.name.is_none());
        assert_eq!(g.in_json, JsonGroupAs::SingletonOrList);
        assert_eq!(g.in_xml, XmlGroupAs::Ungrouped);
    }

    #[test]
    fn test_wire_names() {
        let parsed: JsonGroupAs = serde_json::from_str("\"BY_KEY\"").unwrap();
        assert_eq!(parsed, JsonGroupAs::Keyed);
        assert_eq!(serde_json::to_string(&JsonGroupAs::List).unwrap(), "\"ARRAY\"");
        let parsed: XmlGroupAs = serde_json::from_str("\"GROUPED\"").unwrap();
        assert_eq!(parsed, XmlGroupAs::Grouped);
    }

    #[test]
    fn test_from_raw_keeps_name_and_fills_defaults() {
        let raw = RawGroupAs {
            name: "items".into(),
            in_json: Some(JsonGroupAs::Keyed),
            in_xml: None,
        };
        let g = GroupAs::from_raw(Some(&raw));
        assert_eq!(g.name.as_deref(), Some("items"));
        assert_eq!(g.in_json, JsonGroupAs::Keyed);
        assert_eq!(g.in_xml, XmlGroupAs::Ungrouped);
        assert_eq!(g.in_json.to_string(), "BY_KEY");
    }
}
