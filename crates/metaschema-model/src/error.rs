//! # Model Errors
//!
//! Every failure raised while building or resolving a module. Errors are
//! `Clone` because lazily built containers memoize them: the first access
//! computes the error, every later access receives the same value.

use metaschema_constraint::ConstraintError;
use metaschema_core::CoreError;
use thiserror::Error;

use crate::definition::DefinitionKind;

/// Convenience alias used throughout this crate.
pub type ModelResult<T> = Result<T, ModelError>;

/// Error raised by module building, reference resolution, and loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A `ref` did not resolve to a visible definition of the expected kind.
    #[error(
        "unable to resolve {kind} reference '{reference}' in definition '{definition}' in module '{module}'"
    )]
    UnresolvedReference {
        kind: DefinitionKind,
        /// The reference text as written.
        reference: String,
        /// The definition containing the reference.
        definition: String,
        /// Short name of the module being resolved.
        module: String,
    },

    /// Two global definitions of one kind share a qualified name.
    #[error("duplicate {kind} definition '{name}' in module '{module}'")]
    DuplicateDefinition {
        kind: DefinitionKind,
        name: String,
        module: String,
    },

    /// A `json-key` names a flag the definition does not have.
    #[error("json-key flag '{flag}' is not a flag of '{definition}' in module '{module}'")]
    InvalidJsonKey {
        flag: String,
        definition: String,
        module: String,
    },

    /// A `json-value-key-flag` names a flag the field does not have.
    #[error("json-value-key flag '{flag}' is not a flag of '{definition}' in module '{module}'")]
    InvalidJsonValueKeyFlag {
        flag: String,
        definition: String,
        module: String,
    },

    /// A constraint attached to a definition failed to compile.
    #[error("constraint in '{definition}' in module '{module}': {source}")]
    Constraint {
        definition: String,
        module: String,
        #[source]
        source: ConstraintError,
    },

    /// Name, datatype, value, occurrence, or URI error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The owning module was dropped while a definition was still in use.
    #[error("module owning '{definition}' has been released")]
    ModuleReleased { definition: String },

    /// Module imports form a cycle.
    #[error("import cycle: {chain}")]
    ImportCycle {
        /// Locations along the cycle, joined by ` -> `.
        chain: String,
    },

    /// An import href does not name a known module document.
    #[error("module '{module}' imports '{href}', which is not available")]
    MissingImport { href: String, module: String },
}
