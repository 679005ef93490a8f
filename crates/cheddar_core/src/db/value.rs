//! `Value` <-> SQLite cell conversion.

use crate::model::row::Row;
use crate::model::value::Value;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(flag) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*flag))),
            Value::Integer(number) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*number)),
            Value::Real(number) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*number)),
            Value::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Value::Uuid(id) => ToSqlOutput::Owned(rusqlite::types::Value::Text(id.to_string())),
            // Microseconds keep timestamp comparisons numeric inside SQL filters.
            Value::Timestamp(at) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Integer(at.timestamp_micros()))
            }
            Value::Blob(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
        })
    }
}

fn from_value_ref(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::Integer(number),
        ValueRef::Real(number) => Value::Real(number),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Returns `value` as SQLite hands it back once stored (timestamps at
/// microsecond precision, UUIDs as text, booleans as integers).
pub fn stored_value(value: &Value) -> rusqlite::Result<Value> {
    Ok(match value.to_sql()? {
        ToSqlOutput::Borrowed(cell) => from_value_ref(cell),
        ToSqlOutput::Owned(owned) => from_value_ref(ValueRef::from(&owned)),
        _ => value.clone(),
    })
}

/// Copies every cell of a result row into a [`Row`], keyed by column name.
pub fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let statement = row.as_ref();
    let mut out = Row::new();
    for index in 0..statement.column_count() {
        let name = statement.column_name(index)?.to_string();
        out.set(name, from_value_ref(row.get_ref(index)?));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::stored_value;
    use crate::model::value::{FromValue, Value};
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn stored_timestamps_drop_sub_microsecond_precision() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();

        let stored = stored_value(&Value::Timestamp(at)).unwrap();
        assert_eq!(stored, Value::Integer(at.timestamp_micros()));

        let read_back = <DateTime<Utc> as FromValue>::from_value(&stored).unwrap();
        assert_eq!(read_back.timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn stored_uuids_and_flags_use_sqlite_affinities() {
        let id = Uuid::new_v4();
        assert_eq!(
            stored_value(&Value::Uuid(id)).unwrap(),
            Value::Text(id.to_string())
        );
        assert_eq!(stored_value(&Value::Bool(true)).unwrap(), Value::Integer(1));
        assert_eq!(stored_value(&Value::Null).unwrap(), Value::Null);
    }
}
