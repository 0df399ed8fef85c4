//! # Constraint Compiler
//!
//! Turns raw constraint blocks into a [`ConstraintSet`]. Let-expressions
//! compile first, in order, then every rule in order. The first failing
//! rule aborts compilation of the whole block.

use metaschema_core::{DataTypeRegistry, MaxOccurs, Properties, Source};

use crate::constraint::{
    AllowedValue, AllowedValuesConstraint, CardinalityConstraint, Constraint, ConstraintCommon,
    ConstraintKind, ExpectConstraint, IndexConstraint, IndexHasKeyConstraint, MatchesConstraint,
    UniqueConstraint, DEFAULT_TARGET,
};
use crate::error::{ConstraintError, ConstraintResult};
use crate::key::{CompiledPattern, KeyField};
use crate::let_expression::Let;
use crate::raw::{
    RawAllowedValues, RawConstraintCommon, RawExpect, RawHasCardinality, RawIndex,
    RawIndexHasKey, RawKeyField, RawLet, RawMatches, RawModelConstraints, RawModelRule,
    RawUnique, RawValueConstraints, RawValueRule,
};
use crate::set::ConstraintSet;

/// Which kind of definition a value constraint block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueContext {
    /// Flag constraints always apply to the flag itself.
    Flag,
    /// Field constraints may target other nodes.
    Field,
}

/// Compiles constraint blocks declared in one module.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintCompiler<'a> {
    datatypes: &'a dyn DataTypeRegistry,
    source: &'a Source,
}

impl<'a> ConstraintCompiler<'a> {
    pub fn new(datatypes: &'a dyn DataTypeRegistry, source: &'a Source) -> Self {
        Self { datatypes, source }
    }

    /// Compile the constraints of a flag or field.
    pub fn compile_value(
        &self,
        raw: &RawValueConstraints,
        context: ValueContext,
    ) -> ConstraintResult<ConstraintSet> {
        let lets = self.compile_lets(&raw.lets)?;
        let rules = raw
            .rules
            .iter()
            .map(|rule| self.compile_value_rule(rule, context))
            .collect::<ConstraintResult<Vec<_>>>()?;
        tracing::debug!(
            module = self.source.module_short_name(),
            ?context,
            lets = lets.len(),
            rules = rules.len(),
            "compiled value constraints"
        );
        Ok(ConstraintSet::new(lets, rules))
    }

    /// Compile the constraints of an assembly.
    pub fn compile_model(&self, raw: &RawModelConstraints) -> ConstraintResult<ConstraintSet> {
        let lets = self.compile_lets(&raw.lets)?;
        let rules = raw
            .rules
            .iter()
            .map(|rule| self.compile_model_rule(rule))
            .collect::<ConstraintResult<Vec<_>>>()?;
        tracing::debug!(
            module = self.source.module_short_name(),
            lets = lets.len(),
            rules = rules.len(),
            "compiled model constraints"
        );
        Ok(ConstraintSet::new(lets, rules))
    }

    fn compile_lets(&self, raw: &[RawLet]) -> ConstraintResult<Vec<Let>> {
        raw.iter().map(|l| Let::compile(l, self.source)).collect()
    }

    fn compile_value_rule(
        &self,
        rule: &RawValueRule,
        context: ValueContext,
    ) -> ConstraintResult<Constraint> {
        let targeted = context == ValueContext::Field;
        match rule {
            RawValueRule::AllowedValues(r) => Ok(self.allowed_values(r, targeted)),
            RawValueRule::Matches(r) => self.matches(r, targeted),
            RawValueRule::Expect(r) => Ok(self.expect(r, targeted)),
            RawValueRule::IndexHasKey(r) => self.index_has_key(r, targeted),
        }
    }

    fn compile_model_rule(&self, rule: &RawModelRule) -> ConstraintResult<Constraint> {
        match rule {
            RawModelRule::AllowedValues(r) => Ok(self.allowed_values(r, true)),
            RawModelRule::Matches(r) => self.matches(r, true),
            RawModelRule::Expect(r) => Ok(self.expect(r, true)),
            RawModelRule::IndexHasKey(r) => self.index_has_key(r, true),
            RawModelRule::Index(r) => self.index(r),
            RawModelRule::Unique(r) => self.unique(r),
            RawModelRule::HasCardinality(r) => self.cardinality(r),
        }
    }

    fn common(&self, raw: &RawConstraintCommon, targeted: bool) -> ConstraintCommon {
        let target = match (&raw.target, targeted) {
            (Some(target), true) => target.clone(),
            (Some(target), false) => {
                if target != DEFAULT_TARGET {
                    tracing::warn!(
                        module = self.source.module_short_name(),
                        target = %target,
                        "flag constraint declares a target; it applies to the flag itself"
                    );
                }
                DEFAULT_TARGET.to_string()
            }
            (None, _) => DEFAULT_TARGET.to_string(),
        };
        ConstraintCommon {
            id: raw.id.clone(),
            level: raw.level.unwrap_or_default(),
            target,
            formal_name: raw.formal_name.clone(),
            description: raw.description.clone(),
            properties: Properties::from_raw(&raw.props),
            remarks: raw.remarks.clone(),
            source: self.source.clone(),
        }
    }

    fn allowed_values(&self, raw: &RawAllowedValues, targeted: bool) -> Constraint {
        let values = raw
            .enums
            .iter()
            .map(|e| AllowedValue {
                value: e.value.clone(),
                deprecated_version: e.deprecated.clone(),
                description: e.description.clone(),
            })
            .collect();
        Constraint::AllowedValues(AllowedValuesConstraint {
            common: self.common(&raw.common, targeted),
            values,
            allow_other: yes_or_no(raw.allow_other.as_deref()),
            extensible: raw.extensible.unwrap_or_default(),
        })
    }

    fn matches(&self, raw: &RawMatches, targeted: bool) -> ConstraintResult<Constraint> {
        let pattern = raw
            .regex
            .as_deref()
            .map(CompiledPattern::compile)
            .transpose()?;
        let datatype = match raw.datatype.as_deref() {
            Some(name) => Some(self.datatypes.lookup(name).ok_or_else(|| {
                ConstraintError::UnrecognizedDataType {
                    name: name.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Constraint::Matches(MatchesConstraint {
            common: self.common(&raw.common, targeted),
            message: raw.message.clone(),
            pattern,
            datatype,
        }))
    }

    fn expect(&self, raw: &RawExpect, targeted: bool) -> Constraint {
        Constraint::Expect(ExpectConstraint {
            common: self.common(&raw.common, targeted),
            message: raw.message.clone(),
            test: raw.test.clone(),
        })
    }

    fn index(&self, raw: &RawIndex) -> ConstraintResult<Constraint> {
        let key_fields = key_fields(ConstraintKind::Index, &raw.name, &raw.key_fields)?;
        Ok(Constraint::Index(IndexConstraint {
            common: self.common(&raw.common, true),
            message: raw.message.clone(),
            name: raw.name.clone(),
            key_fields,
        }))
    }

    fn index_has_key(&self, raw: &RawIndexHasKey, targeted: bool) -> ConstraintResult<Constraint> {
        let key_fields = key_fields(ConstraintKind::IndexHasKey, &raw.name, &raw.key_fields)?;
        Ok(Constraint::IndexHasKey(IndexHasKeyConstraint {
            common: self.common(&raw.common, targeted),
            message: raw.message.clone(),
            index_name: raw.name.clone(),
            key_fields,
        }))
    }

    fn unique(&self, raw: &RawUnique) -> ConstraintResult<Constraint> {
        let label = raw
            .common
            .id
            .as_deref()
            .or(raw.common.target.as_deref())
            .unwrap_or(DEFAULT_TARGET);
        let key_fields = key_fields(ConstraintKind::Unique, label, &raw.key_fields)?;
        Ok(Constraint::Unique(UniqueConstraint {
            common: self.common(&raw.common, true),
            message: raw.message.clone(),
            key_fields,
        }))
    }

    fn cardinality(&self, raw: &RawHasCardinality) -> ConstraintResult<Constraint> {
        let min_occurs = raw.min_occurs.as_deref().map(parse_min_occurs).transpose()?;
        let max_occurs = raw
            .max_occurs
            .as_deref()
            .map(|text| {
                text.parse::<MaxOccurs>()
                    .map_err(|e| ConstraintError::InvalidCardinality {
                        value: text.to_string(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;
        if let (Some(min), Some(MaxOccurs::Bounded(max))) = (min_occurs, max_occurs) {
            if min > max {
                return Err(ConstraintError::InvalidCardinality {
                    value: format!("{min}..{max}"),
                    reason: "min-occurs exceeds max-occurs".to_string(),
                });
            }
        }
        Ok(Constraint::HasCardinality(CardinalityConstraint {
            common: self.common(&raw.common, true),
            message: raw.message.clone(),
            min_occurs,
            max_occurs,
        }))
    }
}

fn yes_or_no(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("yes" | "true"))
}

fn parse_min_occurs(text: &str) -> ConstraintResult<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConstraintError::InvalidCardinality {
            value: text.to_string(),
            reason: "min-occurs must be a non-negative integer".to_string(),
        });
    }
    trimmed
        .parse()
        .map_err(|e: std::num::ParseIntError| ConstraintError::InvalidCardinality {
            value: text.to_string(),
            reason: e.to_string(),
        })
}

fn key_fields(
    kind: ConstraintKind,
    name: &str,
    raw: &[RawKeyField],
) -> ConstraintResult<Vec<KeyField>> {
    if raw.is_empty() {
        return Err(ConstraintError::MissingKeyFields {
            kind: kind.as_str().to_string(),
            name: name.to_string(),
        });
    }
    raw.iter().map(KeyField::compile).collect()
}
