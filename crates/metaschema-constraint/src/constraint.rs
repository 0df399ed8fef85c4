//! # Compiled Constraints
//!
//! Seven constraint kinds share one [`ConstraintCommon`] header. Every kind
//! except allowed-values may carry a message template.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use metaschema_core::{DataTypeAdapter, MaxOccurs, Properties, Source};

use crate::key::{CompiledPattern, KeyField};

/// Target expression meaning "the context node".
pub const DEFAULT_TARGET: &str = ".";

/// Severity reported when a constraint is violated.
///
/// Ordered so that `Critical > Error > Warning > Informational > Debug`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Informational,
    Warning,
    #[default]
    Error,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Informational => "INFORMATIONAL",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Self::Debug),
            "INFORMATIONAL" => Ok(Self::Informational),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unknown constraint level: {other}")),
        }
    }
}

/// Whether other constraint sets may add values to an allowed-values list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extensible {
    /// Only constraints in the same model may extend.
    Model,
    /// External constraint sets may extend.
    #[default]
    External,
    /// No extension.
    None,
}

impl Extensible {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::External => "external",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Extensible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header shared by every compiled constraint.
#[derive(Debug, Clone)]
pub struct ConstraintCommon {
    pub id: Option<String>,
    pub level: Level,
    /// Metapath selecting the nodes the constraint applies to.
    pub target: String,
    pub formal_name: Option<String>,
    pub description: Option<String>,
    pub properties: Properties,
    pub remarks: Option<String>,
    pub source: Source,
}

impl ConstraintCommon {
    /// A header with every optional attribute unset.
    pub fn new(source: Source) -> Self {
        Self {
            id: None,
            level: Level::default(),
            target: DEFAULT_TARGET.to_string(),
            formal_name: None,
            description: None,
            properties: Properties::default(),
            remarks: None,
            source,
        }
    }
}

/// One permitted value of an allowed-values constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedValue {
    pub value: String,
    pub deprecated_version: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AllowedValuesConstraint {
    pub common: ConstraintCommon,
    pub values: Vec<AllowedValue>,
    pub allow_other: bool,
    pub extensible: Extensible,
}

impl AllowedValuesConstraint {
    /// The entry for `value`, if listed.
    pub fn allowed_value(&self, value: &str) -> Option<&AllowedValue> {
        self.values.iter().find(|v| v.value == value)
    }

    /// Returns `true` if `value` is listed or other values are allowed.
    pub fn permits(&self, value: &str) -> bool {
        self.allow_other || self.allowed_value(value).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct MatchesConstraint {
    pub common: ConstraintCommon,
    pub message: Option<String>,
    pub pattern: Option<CompiledPattern>,
    pub datatype: Option<Arc<dyn DataTypeAdapter>>,
}

#[derive(Debug, Clone)]
pub struct ExpectConstraint {
    pub common: ConstraintCommon,
    pub message: Option<String>,
    /// Metapath that must evaluate to true.
    pub test: String,
}

#[derive(Debug, Clone)]
pub struct IndexConstraint {
    pub common: ConstraintCommon,
    pub message: Option<String>,
    pub name: String,
    pub key_fields: Vec<KeyField>,
}

#[derive(Debug, Clone)]
pub struct IndexHasKeyConstraint {
    pub common: ConstraintCommon,
    pub message: Option<String>,
    /// Name of the index the key must be present in.
    pub index_name: String,
    pub key_fields: Vec<KeyField>,
}

#[derive(Debug, Clone)]
pub struct UniqueConstraint {
    pub common: ConstraintCommon,
    pub message: Option<String>,
    pub key_fields: Vec<KeyField>,
}

#[derive(Debug, Clone)]
pub struct CardinalityConstraint {
    pub common: ConstraintCommon,
    pub message: Option<String>,
    pub min_occurs: Option<u32>,
    pub max_occurs: Option<MaxOccurs>,
}

impl CardinalityConstraint {
    /// Effective minimum; an omitted bound reads as 0.
    pub fn effective_min_occurs(&self) -> u32 {
        self.min_occurs.unwrap_or(0)
    }
}

/// Discriminant of a [`Constraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    AllowedValues,
    Matches,
    Expect,
    Index,
    IndexHasKey,
    Unique,
    HasCardinality,
}

impl ConstraintKind {
    /// Rule name as written in modules.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowedValues => "allowed-values",
            Self::Matches => "matches",
            Self::Expect => "expect",
            Self::Index => "index",
            Self::IndexHasKey => "index-has-key",
            Self::Unique => "is-unique",
            Self::HasCardinality => "has-cardinality",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled constraint.
#[derive(Debug, Clone)]
pub enum Constraint {
    AllowedValues(AllowedValuesConstraint),
    Matches(MatchesConstraint),
    Expect(ExpectConstraint),
    Index(IndexConstraint),
    IndexHasKey(IndexHasKeyConstraint),
    Unique(UniqueConstraint),
    HasCardinality(CardinalityConstraint),
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::AllowedValues(_) => ConstraintKind::AllowedValues,
            Self::Matches(_) => ConstraintKind::Matches,
            Self::Expect(_) => ConstraintKind::Expect,
            Self::Index(_) => ConstraintKind::Index,
            Self::IndexHasKey(_) => ConstraintKind::IndexHasKey,
            Self::Unique(_) => ConstraintKind::Unique,
            Self::HasCardinality(_) => ConstraintKind::HasCardinality,
        }
    }

    pub fn common(&self) -> &ConstraintCommon {
        match self {
            Self::AllowedValues(c) => &c.common,
            Self::Matches(c) => &c.common,
            Self::Expect(c) => &c.common,
            Self::Index(c) => &c.common,
            Self::IndexHasKey(c) => &c.common,
            Self::Unique(c) => &c.common,
            Self::HasCardinality(c) => &c.common,
        }
    }

    /// Message template; allowed-values constraints never carry one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::AllowedValues(_) => None,
            Self::Matches(c) => c.message.as_deref(),
            Self::Expect(c) => c.message.as_deref(),
            Self::Index(c) => c.message.as_deref(),
            Self::IndexHasKey(c) => c.message.as_deref(),
            Self::Unique(c) => c.message.as_deref(),
            Self::HasCardinality(c) => c.message.as_deref(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.common().id.as_deref()
    }

    pub fn level(&self) -> Level {
        self.common().level
    }

    pub fn target(&self) -> &str {
        &self.common().target
    }
}
