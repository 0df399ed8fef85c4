//! # metaschema-constraint — Declarative Constraint Compiler
//!
//! Compiles the constraint declarations attached to Metaschema
//! definitions into normalized, immutable constraint objects.
//!
//! ## Contexts
//!
//! | Context | Raw input | Rules accepted |
//! |---------|-----------|----------------|
//! | Flag value | [`RawValueConstraints`] | allowed-values, matches, expect, index-has-key (no target) |
//! | Field value | [`RawValueConstraints`] | same, with targets |
//! | Assembly model | [`RawModelConstraints`] | the above plus index, is-unique, has-cardinality |
//!
//! The rule enums are closed: a rule that is not legal in a context cannot
//! be represented in that context's raw input.
//!
//! ## Compilation
//!
//! [`ConstraintCompiler`] compiles let-expressions first, in declaration
//! order, then each rule in order. Defaults applied here:
//!
//! - level `ERROR`, target `"."`;
//! - allowed-values: `allow-other = no`, `extensible = external`;
//! - has-cardinality: missing `min-occurs` reads as 0.
//!
//! Regular expressions (matches, key-field patterns) are compiled eagerly
//! and anchored to the whole value. Datatype names resolve through the
//! registry; expressions are stored as strings with their [`Source`].
//!
//! ## Crate Policy
//!
//! - Depends only on `metaschema-core` internally.
//! - Levels are validation-time severities; they never fail compilation.
//!
//! [`Source`]: metaschema_core::Source

pub mod compiler;
pub mod constraint;
pub mod error;
pub mod key;
pub mod let_expression;
pub mod raw;
pub mod set;

pub use compiler::{ConstraintCompiler, ValueContext};
pub use constraint::{
    AllowedValue, AllowedValuesConstraint, CardinalityConstraint, Constraint, ConstraintCommon,
    ConstraintKind, ExpectConstraint, Extensible, IndexConstraint, IndexHasKeyConstraint, Level,
    MatchesConstraint, UniqueConstraint, DEFAULT_TARGET,
};
pub use error::{ConstraintError, ConstraintResult};
pub use key::{CompiledPattern, KeyField};
pub use let_expression::Let;
pub use raw::{RawModelConstraints, RawModelRule, RawValueConstraints, RawValueRule};
pub use set::ConstraintSet;
