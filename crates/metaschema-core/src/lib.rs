//! # metaschema-core — Foundational Types for the Metaschema Model
//!
//! This crate holds the primitives every other `metaschema-*` crate builds
//! on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Qualified names are values.** [`QName`] pairs an optional namespace
//!    with a validated local name. All reference text (`prefix:name`,
//!    `Q{uri}name`, bare names) is parsed through [`QName::parse_eqname`]
//!    against a module's [`NamespaceBindings`].
//!
//! 2. **Datatypes are looked up, never hard-coded.** Definitions and
//!    constraints resolve datatype names through the [`DataTypeRegistry`]
//!    trait. [`BuiltinDataTypes`] covers the standard Metaschema datatypes.
//!
//! 3. **One lazy primitive.** Every derived aggregate in the model is
//!    computed through [`Lazy`], a write-once cell that memoizes success and
//!    failure alike.
//!
//! 4. **Provenance travels with expressions.** Expression strings are
//!    stored, not evaluated; the [`Source`] and its [`StaticContext`]
//!    carry what an evaluator needs later.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `metaschema-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod context;
pub mod datatype;
pub mod error;
pub mod lazy;
pub mod lexical;
pub mod occurrence;
pub mod property;
pub mod qname;

// Re-export primary types for ergonomic imports.
pub use config::ModelConfig;
pub use context::{Source, StaticContext};
pub use datatype::{
    AtomicValue, BuiltinDataType, BuiltinDataTypes, DataTypeAdapter, DataTypeRegistry,
    DEFAULT_DATA_TYPE,
};
pub use error::{CoreError, CoreResult};
pub use lazy::Lazy;
pub use occurrence::{MaxOccurs, Occurrence, UNBOUNDED};
pub use property::{Properties, PropertyKey, RawProperty, DEFAULT_PROPERTY_NAMESPACE};
pub use qname::{NamespaceBindings, QName};

pub use bigdecimal::num_bigint::BigInt;
pub use bigdecimal::BigDecimal;
