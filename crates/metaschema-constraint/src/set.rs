//! The compiled constraints of one definition or instance.

use crate::constraint::{
    AllowedValuesConstraint, CardinalityConstraint, Constraint, ExpectConstraint, IndexConstraint,
    IndexHasKeyConstraint, MatchesConstraint, UniqueConstraint,
};
use crate::let_expression::Let;

/// Let-expressions and rules, each in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    lets: Vec<Let>,
    rules: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new(lets: Vec<Let>, rules: Vec<Constraint>) -> Self {
        Self { lets, rules }
    }

    pub fn is_empty(&self) -> bool {
        self.lets.is_empty() && self.rules.is_empty()
    }

    pub fn lets(&self) -> &[Let] {
        &self.lets
    }

    /// The binding for variable `name`; the last declaration wins.
    pub fn let_expression(&self, name: &str) -> Option<&Let> {
        self.lets.iter().rev().find(|l| l.name.local_name() == name)
    }

    /// Every rule, in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.rules
    }

    pub fn allowed_values(&self) -> impl Iterator<Item = &AllowedValuesConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::AllowedValues(av) => Some(av),
            _ => None,
        })
    }

    pub fn matches(&self) -> impl Iterator<Item = &MatchesConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::Matches(m) => Some(m),
            _ => None,
        })
    }

    pub fn expects(&self) -> impl Iterator<Item = &ExpectConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::Expect(e) => Some(e),
            _ => None,
        })
    }

    pub fn indexes(&self) -> impl Iterator<Item = &IndexConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::Index(i) => Some(i),
            _ => None,
        })
    }

    pub fn index_has_keys(&self) -> impl Iterator<Item = &IndexHasKeyConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::IndexHasKey(i) => Some(i),
            _ => None,
        })
    }

    pub fn unique(&self) -> impl Iterator<Item = &UniqueConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::Unique(u) => Some(u),
            _ => None,
        })
    }

    pub fn cardinalities(&self) -> impl Iterator<Item = &CardinalityConstraint> {
        self.rules.iter().filter_map(|c| match c {
            Constraint::HasCardinality(h) => Some(h),
            _ => None,
        })
    }
}
