//! Column-store collaborator interfaces.
//!
//! # Responsibility
//! - Define the cluster-connect and statement-execution surface the
//!   column-store adapter consumes.
//! - Provide statement rendering (CQL), an in-memory cluster, and (feature
//!   `scylla`) a driver-backed cluster.
//!
//! # Invariants
//! - A session is bound to exactly one keyspace.
//! - Inserts and updates are upserts; deletes of unknown keys are no-ops.

mod memory;
#[cfg(feature = "scylla")]
mod scylla_session;
mod statement;

pub use memory::{MemoryCluster, MemorySession};
#[cfg(feature = "scylla")]
pub use scylla_session::{ScyllaConnector, ScyllaSession};
pub use statement::{CqlStatement, Statement};

use crate::model::row::Row;
use crate::model::value::Value;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnStoreError {
    #[error("cannot reach cluster: {0}")]
    Connection(String),
    #[error("statement failed: {0}")]
    Statement(String),
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
}

/// Opens sessions against a cluster.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    type Session: ColumnSession + 'static;

    /// Connects through `contact_point` and binds the session to `keyspace`.
    async fn connect(
        &self,
        contact_point: &str,
        keyspace: &str,
    ) -> Result<Self::Session, ColumnStoreError>;
}

/// Executes statements within one keyspace.
#[async_trait]
pub trait ColumnSession: Send + Sync {
    /// Runs a `Statement::Select` and returns its rows.
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, ColumnStoreError>;

    /// Runs a mutation (`Insert`, `Update`, `Delete`).
    async fn execute(&self, statement: &Statement) -> Result<(), ColumnStoreError>;

    /// Returns `value` as the store hands it back once written.
    fn stored_value(&self, value: &Value) -> Result<Value, ColumnStoreError> {
        Ok(value.clone())
    }
}
