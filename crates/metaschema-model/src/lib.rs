//! # metaschema-model — Metaschema Module Semantic Model
//!
//! Turns parsed Metaschema module documents into an immutable, navigable
//! graph of definitions and instances.
//!
//! ## Structure
//!
//! - [`Module`]: registry of global assembly, field, and flag definitions
//!   with exported and scoped views across imports.
//! - [`AssemblyDefinition`], [`FieldDefinition`], [`FlagDefinition`]:
//!   global or inline definitions. Containers and constraint sets are
//!   built on first access.
//! - [`FlagContainer`], [`ModelContainer`], [`GroupedModelContainer`]:
//!   ordered instances with name-keyed views. Empty containers are shared.
//! - [`ModuleLoader`]: builds a module and its imports from raw documents
//!   keyed by location.
//!
//! ## Example
//!
//! ```
//! use metaschema_model::{BuildContext, Module, RawModule};
//!
//! let raw: RawModule = serde_json::from_str(r#"{
//!     "short-name": "demo",
//!     "namespace": "urn:demo",
//!     "definitions": [
//!         {"type": "define-flag", "name": "id"},
//!         {"type": "define-assembly", "name": "doc", "root-name": "doc",
//!          "flags": [{"type": "flag", "ref": "id", "required": "yes"}]}
//!     ]
//! }"#).unwrap();
//! let module = Module::build(raw, Vec::new(), &BuildContext::default()).unwrap();
//! let doc = module.root_assembly_definitions().next().unwrap();
//! assert!(doc.flag_instance("id").unwrap().unwrap().is_required());
//! ```
//!
//! ## Crate Policy
//!
//! - Built objects are immutable and `Send + Sync`.
//! - Definitions hold a weak handle to their module; dropping the module
//!   turns lazy accessors into [`ModelError::ModuleReleased`].
//! - Every failure surfaces once, at the access that triggers it, and is
//!   memoized.

pub mod choice_group;
pub mod context;
pub mod definition;
pub mod error;
pub mod flag_container;
pub mod grouping;
pub mod instance;
pub mod loader;
pub mod model_container;
pub mod module;
pub mod named_map;
pub mod raw;

pub use choice_group::GroupedModelContainer;
pub use context::BuildContext;
pub use definition::{
    AssemblyDefinition, Definition, DefinitionKind, Documentation, FieldDefinition,
    FlagDefinition, Named, Scope,
};
pub use error::{ModelError, ModelResult};
pub use flag_container::FlagContainer;
pub use grouping::{GroupAs, JsonGroupAs, XmlGroupAs};
pub use instance::{
    AssemblyInstance, ChoiceGroupInstance, ChoiceInstance, FieldInstance, FlagInstance,
    GroupedAssemblyInstance, GroupedFieldInstance, GroupedInstance, InstanceForm,
    ModelInstance, NamedModelInstance, DEFAULT_DISCRIMINATOR,
};
pub use loader::ModuleLoader;
pub use model_container::ModelContainer;
pub use module::Module;
pub use named_map::NamedMap;
pub use raw::RawModule;
