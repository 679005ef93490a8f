//! Typed filter expressions.
//!
//! A `Filter` is a conjunction of `(column, operator, value)` conditions.
//! Adapters compile it into their native query language; the in-memory
//! column store evaluates it directly with [`Filter::matches`].

use crate::model::entity::Entity;
use crate::model::row::Row;
use crate::model::value::Value;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    /// Operator token shared by SQL and CQL.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `column <op> value` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

/// Conjunction of conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter with a single condition.
    pub fn by(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::all().and(column, operator, value)
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::by(column, Operator::Eq, value)
    }

    /// Adds a condition that must also hold.
    pub fn and(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the first column that `E` does not declare, if any.
    pub fn unknown_column<E: Entity>(&self) -> Option<&str> {
        self.conditions
            .iter()
            .map(|condition| condition.column.as_str())
            .find(|column| !E::has_column(column))
    }

    /// Returns whether the only constraint is key equality on `key_column`.
    pub fn is_key_lookup(&self, key_column: &str) -> bool {
        !self.conditions.is_empty()
            && self
                .conditions
                .iter()
                .all(|c| c.column == key_column && c.operator == Operator::Eq)
    }

    /// Evaluates the filter against a row.
    ///
    /// Missing columns and incomparable values never match.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| {
            row.get(&condition.column)
                .and_then(|cell| cell.compare(&condition.value))
                .is_some_and(|ordering| condition.operator.accepts(ordering))
        })
    }
}
