//! Parameterized SQL for entity CRUD.
//!
//! Placeholders are numbered (`?1`, `?2`, ...) in the order of `params`.

use super::filter::Filter;
use super::{validate_entity, validate_filter, QueryError};
use crate::model::entity::Entity;
use crate::model::row::Row;
use crate::model::value::Value;

/// SQL text with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlStatement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// `SELECT key, columns... FROM table [WHERE ...]`.
    pub fn select<E: Entity>(filter: &Filter) -> Result<Self, QueryError> {
        validate_entity::<E>()?;
        validate_filter::<E>(filter)?;

        let mut sql = format!("SELECT {} FROM {}", select_list::<E>(), E::TABLE);
        let mut params = Vec::with_capacity(filter.conditions().len());
        for (index, condition) in filter.conditions().iter().enumerate() {
            sql.push_str(if index == 0 { " WHERE " } else { " AND " });
            params.push(condition.value.clone());
            sql.push_str(&format!(
                "{} {} ?{}",
                condition.column,
                condition.operator,
                params.len()
            ));
        }

        Ok(Self::new(sql, params))
    }

    /// Zero-row select used to check that the table and columns exist.
    pub fn schema_probe<E: Entity>() -> Result<Self, QueryError> {
        validate_entity::<E>()?;
        Ok(Self::new(
            format!("SELECT {} FROM {} LIMIT 0", select_list::<E>(), E::TABLE),
            Vec::new(),
        ))
    }

    /// `INSERT` of the non-key columns, optionally preceded by an explicit key.
    pub fn insert<E: Entity>(key: Option<Value>, row: &Row) -> Result<Self, QueryError> {
        validate_entity::<E>()?;

        let mut columns = Vec::with_capacity(E::COLUMNS.len() + 1);
        let mut params = Vec::with_capacity(E::COLUMNS.len() + 1);
        if let Some(key) = key {
            columns.push(E::KEY_COLUMN);
            params.push(key);
        }
        for column in E::COLUMNS {
            columns.push(*column);
            params.push(row.get(column).cloned().unwrap_or(Value::Null));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", E::TABLE)
        } else {
            let placeholders = (1..=params.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                E::TABLE,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        Ok(Self::new(sql, params))
    }

    /// `UPDATE` replacing every non-key column of the row with `key`.
    pub fn update<E: Entity>(key: Value, row: &Row) -> Result<Self, QueryError> {
        validate_entity::<E>()?;

        let mut params = Vec::with_capacity(E::COLUMNS.len() + 1);
        let mut assignments = Vec::with_capacity(E::COLUMNS.len());
        for column in E::COLUMNS {
            params.push(row.get(column).cloned().unwrap_or(Value::Null));
            assignments.push(format!("{column} = ?{}", params.len()));
        }
        params.push(key);

        let sql = if assignments.is_empty() {
            // Key-only entities have nothing to replace; still report row presence.
            format!(
                "UPDATE {} SET {} = {} WHERE {} = ?{}",
                E::TABLE,
                E::KEY_COLUMN,
                E::KEY_COLUMN,
                E::KEY_COLUMN,
                params.len()
            )
        } else {
            format!(
                "UPDATE {} SET {} WHERE {} = ?{}",
                E::TABLE,
                assignments.join(", "),
                E::KEY_COLUMN,
                params.len()
            )
        };

        Ok(Self::new(sql, params))
    }

    /// `DELETE` by key.
    pub fn delete<E: Entity>(key: Value) -> Result<Self, QueryError> {
        validate_entity::<E>()?;
        Ok(Self::new(
            format!("DELETE FROM {} WHERE {} = ?1", E::TABLE, E::KEY_COLUMN),
            vec![key],
        ))
    }
}

fn select_list<E: Entity>() -> String {
    std::iter::once(E::KEY_COLUMN)
        .chain(E::COLUMNS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}
