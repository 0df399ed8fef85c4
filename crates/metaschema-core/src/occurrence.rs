//! # Occurrence Bounds
//!
//! Instances and cardinality constraints share one lexical form for their
//! upper bound: `"unbounded"` or a non-negative integer. The numeric sentinel
//! for "unbounded" is `-1` ([`UNBOUNDED`]), exposed through
//! [`MaxOccurs::as_i32`] for callers that want the flat encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Numeric encoding of an unbounded maximum.
pub const UNBOUNDED: i32 = -1;

/// Upper occurrence bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaxOccurs {
    /// At most this many occurrences.
    Bounded(u32),
    /// No upper limit.
    Unbounded,
}

impl MaxOccurs {
    /// `-1` for unbounded, otherwise the bound.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Bounded(n) => i32::try_from(*n).unwrap_or(i32::MAX),
            Self::Unbounded => UNBOUNDED,
        }
    }

    /// Returns `true` if `count` occurrences fit under this bound.
    pub fn admits(&self, count: u32) -> bool {
        match self {
            Self::Bounded(n) => count <= *n,
            Self::Unbounded => true,
        }
    }
}

impl Default for MaxOccurs {
    fn default() -> Self {
        Self::Bounded(1)
    }
}

impl FromStr for MaxOccurs {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "unbounded" {
            return Ok(Self::Unbounded);
        }
        // Only plain digits: "+5" and "-1" are not valid lexical forms.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidOccurrence {
                value: s.to_string(),
                reason: "expected \"unbounded\" or a non-negative integer".to_string(),
            });
        }
        s.parse::<u32>()
            .map(Self::Bounded)
            .map_err(|e| CoreError::InvalidOccurrence {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl TryFrom<String> for MaxOccurs {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MaxOccurs> for String {
    fn from(value: MaxOccurs) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Occurrence bounds of a model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    min: u32,
    max: MaxOccurs,
}

impl Occurrence {
    /// Validate and build occurrence bounds.
    ///
    /// Instances require `max >= 1` and `min <= max`.
    pub fn new(min: u32, max: MaxOccurs) -> CoreResult<Self> {
        if let MaxOccurs::Bounded(n) = max {
            if n == 0 {
                return Err(CoreError::InvalidOccurrence {
                    value: n.to_string(),
                    reason: "max-occurs must be at least 1".to_string(),
                });
            }
            if min > n {
                return Err(CoreError::InvalidOccurrence {
                    value: format!("{min}..{n}"),
                    reason: "min-occurs exceeds max-occurs".to_string(),
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Parse optional lexical bounds, applying defaults (min 0, max 1).
    pub fn parse(min: Option<u32>, max: Option<&str>) -> CoreResult<Self> {
        let max = max.map(str::parse).transpose()?.unwrap_or_default();
        Self::new(min.unwrap_or(0), max)
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> MaxOccurs {
        self.max
    }

    /// Returns `true` if more than one occurrence is allowed.
    pub fn is_repeatable(&self) -> bool {
        !matches!(self.max, MaxOccurs::Bounded(0 | 1))
    }
}

impl Default for Occurrence {
    fn default() -> Self {
        Self {
            min: 0,
            max: MaxOccurs::Bounded(1),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_u32_text_parses_to_itself(n in any::<u32>()) {
            let max: MaxOccurs = n.to_string().parse().unwrap();
            prop_assert_eq!(max, MaxOccurs::Bounded(n));
        }

        #[test]
        fn negative_numbers_rejected(n in 1i64..1_000_000) {
            let text = format!("-{n}");
            prop_assert!(text.parse::<MaxOccurs>().is_err());
        }

        #[test]
        fn non_numeric_text_rejected(s in "[a-zA-Z][a-zA-Z0-9]{0,10}") {
            prop_assume!(s != "unbounded");
            prop_assert!(s.parse::<MaxOccurs>().is_err());
        }

        #[test]
        fn occurrence_accepts_min_le_max(max in 1u32..1000, delta in 0u32..1000) {
            let min = max.saturating_sub(delta);
            let occ = Occurrence::new(min, MaxOccurs::Bounded(max)).unwrap();
            prop_assert!(occ.min() <= max);
        }
    }
}
