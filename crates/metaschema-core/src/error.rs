//! # Error Types
//!
//! Errors raised by the foundational types. All variants carry owned
//! strings so the enum is `Clone`: lazily built aggregates memoize their
//! failure and hand out the same error on every access.

use thiserror::Error;

/// Convenience alias used throughout this crate.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error raised by name parsing, datatype resolution, and value parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Text is not a valid lexical or URI-qualified name.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The offending name text.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A `prefix:name` reference used a prefix with no namespace binding.
    #[error("namespace prefix {prefix:?} is not bound (in {name:?})")]
    UnboundPrefix {
        /// The unbound prefix.
        prefix: String,
        /// The full reference text.
        name: String,
    },

    /// A datatype name is not known to the registry.
    #[error("unrecognized data type: {name}")]
    UnrecognizedDataType {
        /// The datatype name as written.
        name: String,
    },

    /// A lexical value does not conform to its datatype.
    #[error("invalid {datatype} value {value:?}: {reason}")]
    InvalidValue {
        /// Datatype the value was parsed against.
        datatype: String,
        /// The lexical value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An occurrence bound is malformed (e.g. `max-occurs="abc"`).
    #[error("invalid occurrence {value:?}: {reason}")]
    InvalidOccurrence {
        /// The offending text or bound.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A URI could not be parsed or joined.
    #[error("invalid URI {uri:?}: {reason}")]
    InvalidUri {
        /// The URI text.
        uri: String,
        /// Parser message.
        reason: String,
    },

    /// An environment-supplied configuration value is malformed.
    #[error("invalid value {value:?} for {var}")]
    InvalidConfig {
        /// Environment variable name.
        var: String,
        /// The rejected value.
        value: String,
    },
}
