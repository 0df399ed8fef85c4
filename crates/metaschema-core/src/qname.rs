//! # Qualified Names
//!
//! Every definition and model instance in a Metaschema module is keyed by a
//! [`QName`]: an optional namespace URI plus a local name. Reference text
//! inside modules comes in three lexical forms, all handled by
//! [`QName::parse_eqname`]:
//!
//! - `Q{uri}local`: URI-qualified, namespace taken verbatim;
//! - `prefix:local`: resolved through [`NamespaceBindings`];
//! - `local`: placed in the caller-supplied default namespace.
//!
//! Flag instances are keyed by bare local names (see `metaschema-model`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A namespace-qualified name.
///
/// Ordering and hashing consider the namespace first, then the local name,
/// so names from different modules never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    namespace: Option<String>,
    local_name: String,
}

impl QName {
    /// Create a qualified name after validating the local part.
    ///
    /// An empty namespace string is treated as "no namespace".
    pub fn new(namespace: Option<&str>, local_name: &str) -> CoreResult<Self> {
        validate_ncname(local_name)?;
        Ok(Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local_name: local_name.to_string(),
        })
    }

    /// Create a name with no namespace.
    pub fn local(local_name: &str) -> CoreResult<Self> {
        Self::new(None, local_name)
    }

    /// Parse reference text in any of the three lexical forms.
    ///
    /// `default_namespace` applies to unprefixed names only.
    pub fn parse_eqname(
        text: &str,
        bindings: &NamespaceBindings,
        default_namespace: Option<&str>,
    ) -> CoreResult<Self> {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix("Q{") {
            let (uri, local) = rest.split_once('}').ok_or_else(|| CoreError::InvalidName {
                name: text.to_string(),
                reason: "unterminated URI-qualified name".to_string(),
            })?;
            if uri.contains('{') {
                return Err(CoreError::InvalidName {
                    name: text.to_string(),
                    reason: "nested brace in namespace URI".to_string(),
                });
            }
            return Self::new(Some(uri), local);
        }

        match text.split_once(':') {
            Some((prefix, local)) => {
                validate_ncname(prefix)?;
                let uri = bindings
                    .resolve(prefix)
                    .ok_or_else(|| CoreError::UnboundPrefix {
                        prefix: prefix.to_string(),
                        name: text.to_string(),
                    })?;
                Self::new(Some(uri), local)
            }
            None => Self::new(default_namespace, text),
        }
    }

    /// The namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The local part.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns `true` if `text` is a valid non-colonized name.
    pub fn is_ncname(text: &str) -> bool {
        validate_ncname(text).is_ok()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "Q{{{ns}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

fn validate_ncname(text: &str) -> CoreResult<()> {
    let invalid = |reason: &str| CoreError::InvalidName {
        name: text.to_string(),
        reason: reason.to_string(),
    };
    let mut chars = text.chars();
    let first = chars.next().ok_or_else(|| invalid("name is empty"))?;
    if !(first.is_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or underscore"));
    }
    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))) {
        return Err(invalid(&format!("illegal character {bad:?}")));
    }
    Ok(())
}

/// Prefix → namespace URI bindings declared by a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    bindings: BTreeMap<String, String>,
}

impl NamespaceBindings {
    /// Empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`, replacing any earlier binding.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.bindings.insert(prefix.into(), uri.into());
    }

    /// Namespace bound to `prefix`.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// Iterate bindings in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for NamespaceBindings {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (prefix, uri) in iter {
            out.bind(prefix, uri);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://example.com/ns/test";

    fn bindings() -> NamespaceBindings {
        [("t", NS), ("o", "http://example.com/ns/other")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_bare_name_takes_default_namespace() {
        let q = QName::parse_eqname("foo", &bindings(), Some(NS)).unwrap();
        assert_eq!(q.namespace(), Some(NS));
        assert_eq!(q.local_name(), "foo");
    }

    #[test]
    fn test_bare_name_without_default_has_no_namespace() {
        let q = QName::parse_eqname("foo", &bindings(), None).unwrap();
        assert_eq!(q.namespace(), None);
        assert_eq!(q.to_string(), "foo");
    }

    #[test]
    fn test_prefixed_name_resolves_binding() {
        let q = QName::parse_eqname("o:bar", &bindings(), Some(NS)).unwrap();
        assert_eq!(q.namespace(), Some("http://example.com/ns/other"));
        assert_eq!(q.local_name(), "bar");
    }

    #[test]
    fn test_unbound_prefix_is_error() {
        let err = QName::parse_eqname("x:bar", &bindings(), Some(NS)).unwrap_err();
        assert!(matches!(err, CoreError::UnboundPrefix { ref prefix, .. } if prefix == "x"));
    }

    #[test]
    fn test_uri_qualified_name() {
        let q = QName::parse_eqname("Q{urn:a}b", &bindings(), Some(NS)).unwrap();
        assert_eq!(q.namespace(), Some("urn:a"));
        assert_eq!(q.local_name(), "b");
        assert_eq!(q.to_string(), "Q{urn:a}b");
    }

    #[test]
    fn test_uri_qualified_empty_namespace_means_none() {
        let q = QName::parse_eqname("Q{}b", &bindings(), Some(NS)).unwrap();
        assert_eq!(q.namespace(), None);
    }

    #[test]
    fn test_unterminated_uri_qualified_name_rejected() {
        assert!(QName::parse_eqname("Q{urn:a", &bindings(), None).is_err());
    }

    #[test]
    fn test_invalid_local_names_rejected() {
        for bad in ["", "1abc", "a b", "-x", "a/b"] {
            assert!(QName::local(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_valid_local_names_accepted() {
        for good in ["a", "_a", "a-b", "a.b", "a1", "élan"] {
            assert!(QName::is_ncname(good), "{good:?} should be accepted");
        }
    }

    #[test]
    fn test_namespace_distinguishes_equal_local_names() {
        let a = QName::new(Some(NS), "x").unwrap();
        let b = QName::new(Some("urn:other"), "x").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let q = QName::new(Some(NS), "thing").unwrap();
        let parsed = QName::parse_eqname(&q.to_string(), &NamespaceBindings::new(), None).unwrap();
        assert_eq!(parsed, q);
    }

    #[test]
    fn test_bindings_last_bind_wins() {
        let mut b = NamespaceBindings::new();
        b.bind("p", "urn:one");
        b.bind("p", "urn:two");
        assert_eq!(b.resolve("p"), Some("urn:two"));
        assert_eq!(b.len(), 1);
    }
}
