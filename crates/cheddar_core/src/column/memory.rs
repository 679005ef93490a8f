use super::{ClusterConnector, ColumnSession, ColumnStoreError, Statement};
use crate::model::row::Row;
use crate::model::value::Value;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};

type Tables = HashMap<String, Vec<Row>>;

struct ClusterState {
    keyspaces: Mutex<HashMap<String, Tables>>,
    unreachable: AtomicBool,
}

/// Single-process stand-in for a column-store cluster.
///
/// Mirrors the cluster semantics the adapter relies on: sessions bind to an
/// existing keyspace, statements against unknown tables fail, inserts and
/// updates upsert, deletes of unknown keys are no-ops. Clones share data.
#[derive(Clone)]
pub struct MemoryCluster {
    contact_point: String,
    state: Arc<ClusterState>,
}

impl MemoryCluster {
    pub fn new(contact_point: impl Into<String>) -> Self {
        Self {
            contact_point: contact_point.into(),
            state: Arc::new(ClusterState {
                keyspaces: Mutex::new(HashMap::new()),
                unreachable: AtomicBool::new(false),
            }),
        }
    }

    /// Creates `keyspace.table` (and the keyspace) if missing.
    pub fn with_table(self, keyspace: &str, table: &str) -> Self {
        if let Ok(mut keyspaces) = self.state.keyspaces.lock() {
            keyspaces
                .entry(keyspace.to_string())
                .or_default()
                .entry(table.to_string())
                .or_default();
        }
        self
    }

    /// Simulates losing (or regaining) every node.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state
            .unreachable
            .store(unreachable, AtomicOrdering::Release);
    }

    /// Number of rows stored in `keyspace.table`.
    pub fn row_count(&self, keyspace: &str, table: &str) -> usize {
        self.state
            .keyspaces
            .lock()
            .ok()
            .and_then(|keyspaces| {
                keyspaces
                    .get(keyspace)
                    .and_then(|tables| tables.get(table))
                    .map(Vec::len)
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl ClusterConnector for MemoryCluster {
    type Session = MemorySession;

    async fn connect(
        &self,
        contact_point: &str,
        keyspace: &str,
    ) -> Result<MemorySession, ColumnStoreError> {
        if contact_point != self.contact_point || self.state.unreachable.load(AtomicOrdering::Acquire) {
            return Err(ColumnStoreError::Connection(format!(
                "no host reachable at {contact_point}"
            )));
        }

        let known = lock(&self.state)?.contains_key(keyspace);
        if !known {
            return Err(ColumnStoreError::Connection(format!(
                "keyspace `{keyspace}` does not exist"
            )));
        }

        Ok(MemorySession {
            keyspace: keyspace.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

/// Session bound to one keyspace of a [`MemoryCluster`].
pub struct MemorySession {
    keyspace: String,
    state: Arc<ClusterState>,
}

impl MemorySession {
    fn with_table<R>(
        &self,
        table: &str,
        work: impl FnOnce(&mut Vec<Row>) -> R,
    ) -> Result<R, ColumnStoreError> {
        if self.state.unreachable.load(AtomicOrdering::Acquire) {
            return Err(ColumnStoreError::Connection(
                "no host reachable for statement".to_string(),
            ));
        }

        let mut keyspaces = lock(&self.state)?;
        let rows = keyspaces
            .get_mut(&self.keyspace)
            .and_then(|tables| tables.get_mut(table))
            .ok_or_else(|| {
                ColumnStoreError::Statement(format!(
                    "unconfigured table {}.{table}",
                    self.keyspace
                ))
            })?;
        Ok(work(rows))
    }
}

#[async_trait]
impl ColumnSession for MemorySession {
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, ColumnStoreError> {
        let Statement::Select {
            table,
            columns,
            filter,
            ..
        } = statement
        else {
            return Err(ColumnStoreError::Statement(
                "query expects a SELECT statement".to_string(),
            ));
        };

        self.with_table(table, |rows| {
            rows.iter()
                .filter(|row| filter.matches(row))
                .map(|row| {
                    columns
                        .iter()
                        .map(|column| {
                            let value = row.get(column).cloned().unwrap_or(Value::Null);
                            (column.to_string(), value)
                        })
                        .collect::<Row>()
                })
                .collect()
        })
    }

    async fn execute(&self, statement: &Statement) -> Result<(), ColumnStoreError> {
        match statement {
            Statement::Insert {
                table,
                key_column,
                key,
                row,
            }
            | Statement::Update {
                table,
                key_column,
                key,
                row,
            } => self.with_table(table, |rows| {
                match rows.iter_mut().find(|stored| same_key(stored, key_column, key)) {
                    Some(stored) => {
                        for (column, value) in row.iter() {
                            stored.set(column, value.clone());
                        }
                    }
                    None => {
                        let mut stored = Row::new().with(*key_column, key.clone());
                        for (column, value) in row.iter() {
                            stored.set(column, value.clone());
                        }
                        rows.push(stored);
                    }
                }
            }),
            Statement::Delete {
                table,
                key_column,
                key,
            } => self.with_table(table, |rows| {
                rows.retain(|stored| !same_key(stored, key_column, key));
            }),
            Statement::Select { .. } => Err(ColumnStoreError::Statement(
                "execute expects a mutation statement".to_string(),
            )),
        }
    }
}

fn same_key(row: &Row, key_column: &str, key: &Value) -> bool {
    row.get(key_column)
        .and_then(|stored| stored.compare(key))
        .is_some_and(|ordering| ordering == Ordering::Equal)
}

fn lock(state: &ClusterState) -> Result<MutexGuard<'_, HashMap<String, Tables>>, ColumnStoreError> {
    state
        .keyspaces
        .lock()
        .map_err(|_| ColumnStoreError::Statement("cluster state lock poisoned".to_string()))
}
