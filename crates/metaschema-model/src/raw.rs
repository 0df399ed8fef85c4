//! # Raw Module Tree
//!
//! The parsed, unresolved form of a Metaschema module. These types derive
//! `Deserialize` so any serde front-end can produce them. Keys are
//! kebab-case; every polymorphic child carries a `type` tag naming its
//! variant, and each context has its own closed set of variants.
//!
//! ```yaml
//! short-name: catalog
//! namespace: http://example.com/ns/catalog
//! imports:
//!   - href: common.yaml
//! definitions:
//!   - type: define-assembly
//!     name: catalog
//!     root-name: catalog
//!     flags:
//!       - type: flag
//!         ref: id
//!     model:
//!       - type: field
//!         ref: title
//!         min-occurs: 1
//! ```

use serde::Deserialize;

use metaschema_constraint::{RawModelConstraints, RawValueConstraints};
use metaschema_core::lexical::opt_scalar_string;
use metaschema_core::RawProperty;

use crate::definition::Scope;
use crate::grouping::{JsonGroupAs, XmlGroupAs};

/// A complete module document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawModule {
    pub short_name: String,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub json_base_uri: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub imports: Vec<RawImport>,
    #[serde(default)]
    pub namespace_bindings: Vec<RawNamespaceBinding>,
    #[serde(default)]
    pub definitions: Vec<RawDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawImport {
    /// Location of the imported module, relative to the importing one.
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawNamespaceBinding {
    pub prefix: String,
    pub uri: String,
}

/// Documentation attributes shared by definitions and instances.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDocumentation {
    #[serde(default)]
    pub formal_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub props: Vec<RawProperty>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Top-level definitions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawDefinition {
    DefineAssembly(RawDefineAssembly),
    DefineField(RawDefineField),
    DefineFlag(RawDefineFlag),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDefineAssembly {
    pub name: String,
    #[serde(default)]
    pub scope: Option<Scope>,
    /// Binary index of the definition name.
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub use_name: Option<String>,
    #[serde(default)]
    pub use_index: Option<u32>,
    #[serde(default)]
    pub root_name: Option<String>,
    #[serde(default)]
    pub root_index: Option<u32>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
    /// Name of the flag whose value keys this assembly in JSON.
    #[serde(default)]
    pub json_key: Option<String>,
    #[serde(default)]
    pub flags: Vec<RawFlagChild>,
    #[serde(default)]
    pub model: Option<Vec<RawModelChild>>,
    #[serde(default)]
    pub constraint: Option<RawModelConstraints>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDefineField {
    pub name: String,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub use_name: Option<String>,
    #[serde(default)]
    pub use_index: Option<u32>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
    #[serde(default)]
    pub as_type: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub default: Option<String>,
    #[serde(default)]
    pub json_key: Option<String>,
    /// Property name used for the field value in JSON.
    #[serde(default)]
    pub json_value_key: Option<String>,
    /// Flag whose value names the field value property in JSON.
    #[serde(default)]
    pub json_value_key_flag: Option<String>,
    #[serde(default)]
    pub flags: Vec<RawFlagChild>,
    #[serde(default)]
    pub constraint: Option<RawValueConstraints>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDefineFlag {
    pub name: String,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub use_name: Option<String>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
    #[serde(default)]
    pub as_type: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub default: Option<String>,
    #[serde(default)]
    pub constraint: Option<RawValueConstraints>,
}

/// Children of a `flags` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawFlagChild {
    Flag(RawFlagReference),
    DefineFlag(RawInlineFlag),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawFlagReference {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub use_name: Option<String>,
    /// `yes` or `no`.
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub required: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub default: Option<String>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawInlineFlag {
    #[serde(flatten)]
    pub definition: RawDefineFlag,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub required: Option<String>,
}

/// JSON and XML grouping of a repeatable instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawGroupAs {
    pub name: String,
    #[serde(default)]
    pub in_json: Option<JsonGroupAs>,
    #[serde(default)]
    pub in_xml: Option<XmlGroupAs>,
}

/// XML wrapping of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawFieldInXml {
    Wrapped,
    Unwrapped,
    WithWrapper,
}

/// Children of an assembly's `model`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawModelChild {
    Assembly(RawAssemblyReference),
    DefineAssembly(RawInlineAssembly),
    Field(RawFieldReference),
    DefineField(RawInlineField),
    Choice(RawChoice),
    ChoiceGroup(RawChoiceGroup),
}

/// Children of a `choice`: no nested choices.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawChoiceChild {
    Assembly(RawAssemblyReference),
    DefineAssembly(RawInlineAssembly),
    Field(RawFieldReference),
    DefineField(RawInlineField),
}

impl From<RawChoiceChild> for RawModelChild {
    fn from(child: RawChoiceChild) -> Self {
        match child {
            RawChoiceChild::Assembly(r) => Self::Assembly(r),
            RawChoiceChild::DefineAssembly(r) => Self::DefineAssembly(r),
            RawChoiceChild::Field(r) => Self::Field(r),
            RawChoiceChild::DefineField(r) => Self::DefineField(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawAssemblyReference {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub use_name: Option<String>,
    #[serde(default)]
    pub min_occurs: Option<u32>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub max_occurs: Option<String>,
    #[serde(default)]
    pub group_as: Option<RawGroupAs>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawInlineAssembly {
    #[serde(flatten)]
    pub definition: RawDefineAssembly,
    #[serde(default)]
    pub min_occurs: Option<u32>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub max_occurs: Option<String>,
    #[serde(default)]
    pub group_as: Option<RawGroupAs>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawFieldReference {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub use_name: Option<String>,
    #[serde(default)]
    pub min_occurs: Option<u32>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub max_occurs: Option<String>,
    #[serde(default)]
    pub group_as: Option<RawGroupAs>,
    #[serde(default)]
    pub in_xml: Option<RawFieldInXml>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub default: Option<String>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawInlineField {
    #[serde(flatten)]
    pub definition: RawDefineField,
    #[serde(default)]
    pub min_occurs: Option<u32>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub max_occurs: Option<String>,
    #[serde(default)]
    pub group_as: Option<RawGroupAs>,
    #[serde(default)]
    pub in_xml: Option<RawFieldInXml>,
}

/// Exclusive alternatives; exactly one may occur.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawChoice {
    #[serde(default)]
    pub choices: Vec<RawChoiceChild>,
}

/// Repeatable, discriminated union of alternatives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawChoiceGroup {
    #[serde(default)]
    pub min_occurs: Option<u32>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub max_occurs: Option<String>,
    pub group_as: RawGroupAs,
    /// JSON property naming the alternative; defaults to `object-type`.
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub json_key: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub choices: Vec<RawGroupedChild>,
}

/// Alternatives of a choice group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawGroupedChild {
    Assembly(RawGroupedReference),
    DefineAssembly(RawGroupedInlineAssembly),
    Field(RawGroupedReference),
    DefineField(RawGroupedInlineField),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawGroupedReference {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub use_name: Option<String>,
    #[serde(default)]
    pub discriminator_value: Option<String>,
    #[serde(flatten)]
    pub documentation: RawDocumentation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawGroupedInlineAssembly {
    #[serde(flatten)]
    pub definition: RawDefineAssembly,
    #[serde(default)]
    pub discriminator_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawGroupedInlineField {
    #[serde(flatten)]
    pub definition: RawDefineField,
    #[serde(default)]
    pub discriminator_value: Option<String>,
}
