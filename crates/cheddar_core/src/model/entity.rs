//! Entity contracts.
//!
//! # Responsibility
//! - `DataModel`: the minimal capability every stored record exposes.
//! - `Entity`: the column mapping adapters need to translate records.
//!
//! # Invariants
//! - `Entity::COLUMNS` never lists the key column.
//! - `to_row` produces exactly the cells named by `COLUMNS`.

use super::key::Key;
use super::row::{Row, RowError};

/// A record identified by a single key field.
pub trait DataModel: Clone + Send + Sync + 'static {
    type Key: Key;

    fn id(&self) -> &Self::Key;

    fn set_id(&mut self, id: Self::Key);
}

/// A record with a table/column mapping.
pub trait Entity: DataModel {
    /// Table (or column family) holding this entity.
    const TABLE: &'static str;

    /// Column holding the key.
    const KEY_COLUMN: &'static str = "id";

    /// Non-key columns, in binding order.
    const COLUMNS: &'static [&'static str];

    /// Non-key cells of this record.
    fn to_row(&self) -> Row;

    /// Rebuilds a record from a row containing the key and every column.
    fn from_row(row: &Row) -> Result<Self, RowError>;

    /// Returns whether `column` is the key or one of `COLUMNS`.
    fn has_column(column: &str) -> bool {
        column == Self::KEY_COLUMN || Self::COLUMNS.contains(&column)
    }
}
