//! SQLite storage bootstrap, schema migration and connection sharing.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the relational adapter.
//! - Apply caller-supplied schema migrations in deterministic order.
//! - Share one connection between repositories and run its work off the
//!   async executor.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write data before migrations succeed.

pub mod migrations;
mod open;
mod store;
mod transaction;
mod value;

pub use migrations::Migration;
pub use open::{open_db, open_db_in_memory};
pub use store::SqliteStore;
pub use transaction::SqliteTransaction;
pub use value::{read_row, stored_value};

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("migration version {version} does not follow {previous}")]
    InvalidMigrationOrder { previous: u32, version: u32 },
    #[error("sqlite connection lock was poisoned by a panicking holder")]
    Poisoned,
    #[error("sqlite worker task failed: {0}")]
    Worker(String),
}

impl DbError {
    /// Returns whether SQLite rejected the statement on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    /// Returns whether the failure means the database is unreachable.
    pub fn is_connectivity_failure(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
                    | rusqlite::ErrorCode::SystemIoFailure
                    | rusqlite::ErrorCode::PermissionDenied
            ),
            Self::Poisoned | Self::Worker(_) => true,
            _ => false,
        }
    }
}
