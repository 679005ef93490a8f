//! Filter expressions and their SQL compilation.
//!
//! # Responsibility
//! - Replace language-level predicate expressions with a typed `Filter`.
//! - Render filters and CRUD statements as parameterized SQL.
//!
//! # Invariants
//! - Identifiers are validated before they reach any statement text.
//! - Values are always bound as parameters, never spliced into text.

pub mod filter;
pub mod sql;

use crate::model::entity::Entity;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("identifier pattern is valid")
});

/// Errors raised while building statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },
}

/// Checks that `name` is a plain table/column identifier.
pub fn validate_identifier(name: &str) -> Result<(), QueryError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates every identifier of `E`'s mapping.
pub fn validate_entity<E: Entity>() -> Result<(), QueryError> {
    validate_identifier(E::TABLE)?;
    validate_identifier(E::KEY_COLUMN)?;
    for column in E::COLUMNS {
        validate_identifier(column)?;
    }
    Ok(())
}

/// Validates that every filter column belongs to `E`.
pub fn validate_filter<E: Entity>(filter: &filter::Filter) -> Result<(), QueryError> {
    match filter.unknown_column::<E>() {
        Some(column) => Err(QueryError::UnknownColumn {
            table: E::TABLE.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}
