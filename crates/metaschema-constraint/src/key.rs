//! Key fields and compiled patterns.
//!
//! Patterns match the whole value, so `[a-z]+` accepts `"abc"` but not
//! `"abc1"`. Capture groups keep their numbering; a key-field pattern's
//! first group selects the part of the value that forms the key.

use std::fmt;

use regex::Regex;

use crate::error::{ConstraintError, ConstraintResult};
use crate::raw::RawKeyField;

/// A regular expression anchored to the whole input.
#[derive(Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> ConstraintResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            ConstraintError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The key portion of `value`: the first capture group if the pattern
    /// has one, else the whole match.
    pub fn extract<'v>(&self, value: &'v str) -> Option<&'v str> {
        let caps = self.regex.captures(value)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.source).finish()
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// One component of a composite key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyField {
    /// Metapath selecting the key value, relative to the indexed node.
    pub target: String,
    pub pattern: Option<CompiledPattern>,
    pub remarks: Option<String>,
}

impl KeyField {
    pub fn compile(raw: &RawKeyField) -> ConstraintResult<Self> {
        Ok(Self {
            target: raw.target.clone(),
            pattern: raw.pattern.as_deref().map(CompiledPattern::compile).transpose()?,
            remarks: raw.remarks.clone(),
        })
    }
}
