//! Ordered column/value rows exchanged with backends.

use super::value::{FromValue, Value};
use thiserror::Error;

/// Error raised when a stored row cannot be mapped back onto an entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("column `{0}` is missing from the row")]
    MissingColumn(String),
    #[error("column `{column}` holds a {found} value that cannot be read as {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A single entity row: column names paired with cell values, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used by `Entity::to_row` implementations.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets `column`, replacing an existing cell in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Reads `column` as `T`.
    ///
    /// # Errors
    /// - `MissingColumn` when the row has no such cell.
    /// - `TypeMismatch` when the cell cannot be converted to `T`.
    pub fn get_as<T: FromValue>(&self, column: &str) -> Result<T, RowError> {
        let value = self
            .get(column)
            .ok_or_else(|| RowError::MissingColumn(column.to_string()))?;
        T::from_value(value).ok_or_else(|| RowError::TypeMismatch {
            column: column.to_string(),
            expected: std::any::type_name::<T>(),
            found: value.kind(),
        })
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.cells.iter().position(|(name, _)| name == column)?;
        Some(self.cells.remove(index).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.set(column, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::{Row, RowError};
    use crate::model::value::Value;

    #[test]
    fn set_replaces_existing_cell_without_reordering() {
        let mut row = Row::new().with("a", 1i64).with("b", "x");
        row.set("a", 2i64);

        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Value::Integer(2)));
    }

    #[test]
    fn get_as_reports_missing_and_mismatched_columns() {
        let row = Row::new().with("name", "cheddar");

        assert_eq!(
            row.get_as::<i64>("age").unwrap_err(),
            RowError::MissingColumn("age".to_string())
        );
        assert!(matches!(
            row.get_as::<i64>("name").unwrap_err(),
            RowError::TypeMismatch { found: "text", .. }
        ));
        assert_eq!(row.get_as::<String>("name").unwrap(), "cheddar");
    }
}
