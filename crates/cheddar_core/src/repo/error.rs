use crate::column::ColumnStoreError;
use crate::db::DbError;
use crate::model::row::RowError;
use crate::query::QueryError;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error surface shared by every repository adapter.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A contract operation ran before `initialize` succeeded.
    #[error("the repository is not initialized; `{operation}` cannot be completed (at {location})")]
    NotInitialized {
        operation: &'static str,
        location: String,
    },
    #[error("backend unreachable: {0}")]
    Connectivity(String),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("constraint violation: {0}")]
    ConstraintViolation(DbError),
    #[error("no key could be assigned to a new {entity}")]
    KeyAssignment { entity: &'static str },
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] QueryError),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Db(DbError),
    #[error(transparent)]
    ColumnStore(ColumnStoreError),
}

impl RepoError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_constraint_violation() {
            Self::ConstraintViolation(value)
        } else if value.is_connectivity_failure() {
            Self::Connectivity(value.to_string())
        } else {
            Self::Db(value)
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::Sqlite(value))
    }
}

impl From<ColumnStoreError> for RepoError {
    fn from(value: ColumnStoreError) -> Self {
        match value {
            ColumnStoreError::Connection(message) => Self::Connectivity(message),
            other => Self::ColumnStore(other),
        }
    }
}

impl From<RowError> for RepoError {
    fn from(value: RowError) -> Self {
        Self::InvalidData(value.to_string())
    }
}
