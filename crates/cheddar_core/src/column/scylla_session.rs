//! Scylla/Cassandra driver binding (feature `scylla`).
//!
//! Integer cells are bound as `bigint`; tables used through this session
//! should declare integer columns as `bigint` and timestamps as `timestamp`.

use super::{ClusterConnector, ColumnSession, ColumnStoreError, Statement};
use crate::model::row::Row;
use crate::model::value::Value;
use async_trait::async_trait;
use chrono::DateTime;
use log::debug;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::value::{CqlTimestamp, CqlValue};

/// Connects to a real cluster through the `scylla` driver.
#[derive(Debug, Clone, Default)]
pub struct ScyllaConnector;

#[async_trait]
impl ClusterConnector for ScyllaConnector {
    type Session = ScyllaSession;

    async fn connect(
        &self,
        contact_point: &str,
        keyspace: &str,
    ) -> Result<ScyllaSession, ColumnStoreError> {
        let session = SessionBuilder::new()
            .known_node(contact_point)
            .use_keyspace(keyspace, false)
            .build()
            .await
            .map_err(|err| ColumnStoreError::Connection(err.to_string()))?;
        Ok(ScyllaSession { session })
    }
}

pub struct ScyllaSession {
    session: Session,
}

#[async_trait]
impl ColumnSession for ScyllaSession {
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, ColumnStoreError> {
        let cql = statement.to_cql();
        debug!("event=cql_query module=column status=start cql={}", cql.cql);

        let result = self
            .session
            .query_unpaged(cql.cql, bind_values(&cql.values)?)
            .await
            .map_err(statement_error)?
            .into_rows_result()
            .map_err(statement_error)?;

        let names = result
            .column_specs()
            .iter()
            .map(|spec| spec.name().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for typed in result
            .rows::<scylla::value::Row>()
            .map_err(statement_error)?
        {
            let typed = typed.map_err(statement_error)?;
            let mut row = Row::new();
            for (name, cell) in names.iter().zip(typed.columns) {
                row.set(name.as_str(), from_cql(cell)?);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> Result<(), ColumnStoreError> {
        let cql = statement.to_cql();
        debug!("event=cql_execute module=column status=start cql={}", cql.cql);

        self.session
            .query_unpaged(cql.cql, bind_values(&cql.values)?)
            .await
            .map_err(statement_error)?;
        Ok(())
    }

    fn stored_value(&self, value: &Value) -> Result<Value, ColumnStoreError> {
        from_cql(to_cql(value)?)
    }
}

fn statement_error(err: impl std::fmt::Display) -> ColumnStoreError {
    ColumnStoreError::Statement(err.to_string())
}

fn bind_values(values: &[Value]) -> Result<Vec<Option<CqlValue>>, ColumnStoreError> {
    values.iter().map(to_cql).collect()
}

fn to_cql(value: &Value) -> Result<Option<CqlValue>, ColumnStoreError> {
    Ok(match value {
        Value::Null => None,
        Value::Bool(flag) => Some(CqlValue::Boolean(*flag)),
        Value::Integer(number) => Some(CqlValue::BigInt(*number)),
        Value::Real(number) => Some(CqlValue::Double(*number)),
        Value::Text(text) => Some(CqlValue::Text(text.clone())),
        Value::Uuid(id) => Some(CqlValue::Uuid(*id)),
        Value::Timestamp(at) => Some(CqlValue::Timestamp(CqlTimestamp(at.timestamp_millis()))),
        Value::Blob(bytes) => Some(CqlValue::Blob(bytes.clone())),
    })
}

fn from_cql(cell: Option<CqlValue>) -> Result<Value, ColumnStoreError> {
    let Some(cell) = cell else {
        return Ok(Value::Null);
    };
    Ok(match cell {
        CqlValue::Boolean(flag) => Value::Bool(flag),
        CqlValue::TinyInt(number) => Value::Integer(i64::from(number)),
        CqlValue::SmallInt(number) => Value::Integer(i64::from(number)),
        CqlValue::Int(number) => Value::Integer(i64::from(number)),
        CqlValue::BigInt(number) => Value::Integer(number),
        CqlValue::Float(number) => Value::Real(f64::from(number)),
        CqlValue::Double(number) => Value::Real(number),
        CqlValue::Text(text) | CqlValue::Ascii(text) => Value::Text(text),
        CqlValue::Uuid(id) => Value::Uuid(id),
        CqlValue::Timestamp(CqlTimestamp(millis)) => DateTime::from_timestamp_millis(millis)
            .map(Value::Timestamp)
            .ok_or_else(|| {
                ColumnStoreError::UnsupportedValue(format!("timestamp {millis} out of range"))
            })?,
        CqlValue::Blob(bytes) => Value::Blob(bytes),
        other => {
            return Err(ColumnStoreError::UnsupportedValue(format!("{other:?}")));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn stored_timestamps_keep_milliseconds_only() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();

        let stored = from_cql(to_cql(&Value::Timestamp(at)).unwrap()).unwrap();

        let expected = Utc.timestamp_opt(1_700_000_000, 123_000_000).unwrap();
        assert_eq!(stored, Value::Timestamp(expected));
    }

    #[test]
    fn stored_nulls_stay_null() {
        assert_eq!(from_cql(to_cql(&Value::Null).unwrap()).unwrap(), Value::Null);
    }
}
