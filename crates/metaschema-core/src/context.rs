//! # Static Context and Provenance
//!
//! Expressions (constraint targets, `expect` tests, let-expressions) are
//! stored as strings. The [`StaticContext`] records what an external
//! evaluator needs to interpret them later, and a [`Source`] ties every
//! compiled object back to the module it came from.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::qname::NamespaceBindings;

/// Information needed to evaluate expressions declared in a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticContext {
    base_uri: Option<Url>,
    default_model_namespace: Option<String>,
    bindings: NamespaceBindings,
}

impl StaticContext {
    pub fn new(
        base_uri: Option<Url>,
        default_model_namespace: Option<String>,
        bindings: NamespaceBindings,
    ) -> Self {
        Self {
            base_uri,
            default_model_namespace,
            bindings,
        }
    }

    /// Location of the module document, used to resolve relative URIs.
    pub fn base_uri(&self) -> Option<&Url> {
        self.base_uri.as_ref()
    }

    /// Namespace applied to unprefixed model names.
    pub fn default_model_namespace(&self) -> Option<&str> {
        self.default_model_namespace.as_deref()
    }

    pub fn bindings(&self) -> &NamespaceBindings {
        &self.bindings
    }
}

/// Where a compiled constraint or let-expression was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    module_short_name: String,
    location: Option<Url>,
    static_context: Arc<StaticContext>,
}

impl Source {
    pub fn new(
        module_short_name: impl Into<String>,
        location: Option<Url>,
        static_context: Arc<StaticContext>,
    ) -> Self {
        Self {
            module_short_name: module_short_name.into(),
            location,
            static_context,
        }
    }

    /// A source with no location and an empty static context.
    pub fn detached(module_short_name: impl Into<String>) -> Self {
        Self::new(module_short_name, None, Arc::new(StaticContext::default()))
    }

    pub fn module_short_name(&self) -> &str {
        &self.module_short_name
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    pub fn static_context(&self) -> &Arc<StaticContext> {
        &self.static_context
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "module '{}' ({loc})", self.module_short_name),
            None => write!(f, "module '{}'", self.module_short_name),
        }
    }
}
