//! Constraint compilation errors.

use thiserror::Error;

/// Convenience alias used throughout this crate.
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// A constraint declaration that cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// A `matches` regex or key-field pattern failed to compile.
    #[error("invalid regular expression {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// A `matches` datatype is not known to the registry.
    #[error("unrecognized data type: {name}")]
    UnrecognizedDataType { name: String },

    /// A `has-cardinality` bound is malformed or inconsistent.
    #[error("invalid cardinality {value:?}: {reason}")]
    InvalidCardinality { value: String, reason: String },

    /// An index, index-has-key, or unique constraint declared no key fields.
    #[error("{kind} constraint '{name}' declares no key fields")]
    MissingKeyFields { kind: String, name: String },

    /// A let-expression variable name is not a valid name.
    #[error("invalid let variable name {name:?}")]
    InvalidLetName { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConstraintError::MissingKeyFields {
            kind: "index".into(),
            name: "by-id".into(),
        };
        assert_eq!(err.to_string(), "index constraint 'by-id' declares no key fields");

        let err = ConstraintError::InvalidCardinality {
            value: "abc".into(),
            reason: "not a number".into(),
        };
        assert!(err.to_string().contains("\"abc\""));
    }
}
