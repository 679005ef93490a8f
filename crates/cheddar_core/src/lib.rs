//! Core persistence layer for Cheddar.
//! One async CRUD contract for entity types, bound to SQLite or a
//! column-store cluster.

pub mod column;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use column::{ClusterConnector, ColumnSession, ColumnStoreError, MemoryCluster};
pub use config::{CheddarConfig, ColumnStoreConfig, ConfigError, LoggingConfig, RelationalConfig};
pub use db::{DbError, Migration, SqliteStore, SqliteTransaction};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{DataModel, Entity};
pub use model::key::{comb_uuid, Key};
pub use model::row::{Row, RowError};
pub use model::value::{FromValue, Value};
pub use query::filter::{Condition, Filter, Operator};
pub use repo::{
    ColumnStoreRepository, Readiness, RepoError, RepoResult, Repository, SqliteRepository,
    TransactionHandle, TransactionSupport,
};
pub use service::RepositoryService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
