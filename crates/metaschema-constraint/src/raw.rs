//! # Raw Constraint Declarations
//!
//! The parsed, uncompiled form of a definition's `constraint` block. These
//! types derive `Deserialize` with kebab-case keys; rules are tagged by a
//! `type` key whose value is the rule name as written in modules
//! (`allowed-values`, `matches`, `expect`, `index-has-key`, `index`,
//! `is-unique`, `has-cardinality`).
//!
//! ```yaml
//! lets:
//!   - var: all-ids
//!     expression: "//@id"
//! rules:
//!   - type: allowed-values
//!     allow-other: "no"
//!     enums:
//!       - value: A
//!       - value: B
//! ```

use serde::Deserialize;

use metaschema_core::lexical::{opt_scalar_string, scalar_string};
use metaschema_core::RawProperty;

use crate::constraint::{Extensible, Level};

/// Constraints attached to a flag or field value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawValueConstraints {
    #[serde(default)]
    pub lets: Vec<RawLet>,
    #[serde(default)]
    pub rules: Vec<RawValueRule>,
}

impl RawValueConstraints {
    pub fn is_empty(&self) -> bool {
        self.lets.is_empty() && self.rules.is_empty()
    }
}

/// Constraints attached to an assembly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawModelConstraints {
    #[serde(default)]
    pub lets: Vec<RawLet>,
    #[serde(default)]
    pub rules: Vec<RawModelRule>,
}

impl RawModelConstraints {
    pub fn is_empty(&self) -> bool {
        self.lets.is_empty() && self.rules.is_empty()
    }
}

/// Rules legal in a value context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawValueRule {
    AllowedValues(RawAllowedValues),
    Matches(RawMatches),
    Expect(RawExpect),
    IndexHasKey(RawIndexHasKey),
}

/// Rules legal in an assembly's model context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawModelRule {
    AllowedValues(RawAllowedValues),
    Matches(RawMatches),
    Expect(RawExpect),
    IndexHasKey(RawIndexHasKey),
    Index(RawIndex),
    #[serde(rename = "is-unique")]
    Unique(RawUnique),
    HasCardinality(RawHasCardinality),
}

impl From<RawValueRule> for RawModelRule {
    fn from(rule: RawValueRule) -> Self {
        match rule {
            RawValueRule::AllowedValues(r) => Self::AllowedValues(r),
            RawValueRule::Matches(r) => Self::Matches(r),
            RawValueRule::Expect(r) => Self::Expect(r),
            RawValueRule::IndexHasKey(r) => Self::IndexHasKey(r),
        }
    }
}

/// `let` binding of a variable to an expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawLet {
    pub var: String,
    pub expression: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Attributes shared by every rule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawConstraintCommon {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub formal_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub props: Vec<RawProperty>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawAllowedValues {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    /// `yes` or `no`.
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub allow_other: Option<String>,
    #[serde(default)]
    pub extensible: Option<Extensible>,
    #[serde(default)]
    pub enums: Vec<RawEnumValue>,
}

/// One permitted value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawEnumValue {
    #[serde(deserialize_with = "scalar_string")]
    pub value: String,
    /// Version in which the value was deprecated.
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawMatches {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawExpect {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    #[serde(default)]
    pub message: Option<String>,
    pub test: String,
}

/// One component of a composite key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawKeyField {
    pub target: String,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawIndex {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    #[serde(default)]
    pub message: Option<String>,
    pub name: String,
    #[serde(default)]
    pub key_fields: Vec<RawKeyField>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawIndexHasKey {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    #[serde(default)]
    pub message: Option<String>,
    pub name: String,
    #[serde(default)]
    pub key_fields: Vec<RawKeyField>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawUnique {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub key_fields: Vec<RawKeyField>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawHasCardinality {
    #[serde(flatten)]
    pub common: RawConstraintCommon,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub min_occurs: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub max_occurs: Option<String>,
}
