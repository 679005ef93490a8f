//! Structured column-store statements and their CQL rendering.

use crate::model::row::Row;
use crate::model::value::Value;
use crate::query::filter::Filter;

/// One statement against a table of the session's keyspace.
///
/// `columns` always lists the key column first.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select {
        table: &'static str,
        key_column: &'static str,
        columns: Vec<&'static str>,
        filter: Filter,
    },
    Insert {
        table: &'static str,
        key_column: &'static str,
        key: Value,
        row: Row,
    },
    Update {
        table: &'static str,
        key_column: &'static str,
        key: Value,
        row: Row,
    },
    Delete {
        table: &'static str,
        key_column: &'static str,
        key: Value,
    },
}

/// CQL text with positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct CqlStatement {
    pub cql: String,
    pub values: Vec<Value>,
}

impl Statement {
    /// Renders the statement as CQL.
    ///
    /// Selects constrained by anything other than key equality get
    /// `ALLOW FILTERING`, which the cluster requires to filter on
    /// non-partition-key columns.
    pub fn to_cql(&self) -> CqlStatement {
        match self {
            Self::Select {
                table,
                key_column,
                columns,
                filter,
            } => {
                let mut cql = format!("SELECT {} FROM {}", columns.join(", "), table);
                let mut values = Vec::with_capacity(filter.conditions().len());
                for (index, condition) in filter.conditions().iter().enumerate() {
                    cql.push_str(if index == 0 { " WHERE " } else { " AND " });
                    cql.push_str(&format!("{} {} ?", condition.column, condition.operator));
                    values.push(condition.value.clone());
                }
                if !filter.is_empty() && !filter.is_key_lookup(key_column) {
                    cql.push_str(" ALLOW FILTERING");
                }
                CqlStatement { cql, values }
            }
            Self::Insert {
                table,
                key_column,
                key,
                row,
            } => {
                let mut columns = vec![*key_column];
                let mut values = vec![key.clone()];
                for (column, value) in row.iter() {
                    columns.push(column);
                    values.push(value.clone());
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                CqlStatement {
                    cql: format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        table,
                        columns.join(", "),
                        placeholders
                    ),
                    values,
                }
            }
            Self::Update {
                table,
                key_column,
                key,
                row,
            } if row.is_empty() => Self::Insert {
                table: *table,
                key_column: *key_column,
                key: key.clone(),
                row: Row::new(),
            }
            .to_cql(),
            Self::Update {
                table,
                key_column,
                key,
                row,
            } => {
                let mut assignments = Vec::with_capacity(row.len());
                let mut values = Vec::with_capacity(row.len() + 1);
                for (column, value) in row.iter() {
                    assignments.push(format!("{column} = ?"));
                    values.push(value.clone());
                }
                values.push(key.clone());
                CqlStatement {
                    cql: format!(
                        "UPDATE {} SET {} WHERE {} = ?",
                        table,
                        assignments.join(", "),
                        key_column
                    ),
                    values,
                }
            }
            Self::Delete {
                table,
                key_column,
                key,
            } => CqlStatement {
                cql: format!("DELETE FROM {table} WHERE {key_column} = ?"),
                values: vec![key.clone()],
            },
        }
    }
}
