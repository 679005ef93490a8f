//! Shared SQLite connection handle.
//!
//! # Responsibility
//! - Own one migrated SQLite connection shared by every repository bound to
//!   the same database.
//! - Run blocking SQLite work on tokio's blocking pool.
//!
//! # Invariants
//! - At most one closure touches the connection at a time.
//! - A panic while holding the connection poisons the store; later calls fail
//!   with `DbError::Poisoned` instead of observing half-applied state.

use super::migrations::Migration;
use super::open::{open_with, DEFAULT_BUSY_TIMEOUT};
use super::{DbError, DbResult};
use crate::config::RelationalConfig;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Cloneable handle to a single SQLite connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Wraps an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens the database described by `config` and applies `migrations`.
    ///
    /// A missing `database_path` opens a private in-memory database.
    pub fn open(config: &RelationalConfig, migrations: &[Migration]) -> DbResult<Self> {
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let conn = match &config.database_path {
            Some(path) => open_with("file", || Connection::open(path), busy_timeout, migrations)?,
            None => open_with("memory", Connection::open_in_memory, busy_timeout, migrations)?,
        };
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database with default settings.
    pub fn open_in_memory(migrations: &[Migration]) -> DbResult<Self> {
        let conn = open_with(
            "memory",
            Connection::open_in_memory,
            DEFAULT_BUSY_TIMEOUT,
            migrations,
        )?;
        Ok(Self::from_connection(conn))
    }

    /// Runs `work` against the connection on the blocking pool.
    ///
    /// # Errors
    /// - `DbError::Worker` when the blocking task panics or is cancelled.
    /// - `DbError::Poisoned` when an earlier holder panicked.
    /// - Whatever `work` returns.
    pub async fn with_connection<F, R, E>(&self, work: F) -> Result<R, E>
    where
        F: FnOnce(&mut Connection) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<R, E> {
            let mut guard = conn.lock().map_err(|_| DbError::Poisoned)?;
            work(&mut guard)
        })
        .await
        .map_err(|err| DbError::Worker(err.to_string()))?
    }

    /// Lightweight connectivity probe (`SELECT 1`).
    pub async fn probe(&self) -> DbResult<()> {
        self.with_connection(|conn| -> DbResult<()> {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    /// Runs `work` synchronously on the calling thread.
    ///
    /// Only used from `Drop` paths that cannot await.
    pub(crate) fn with_connection_blocking<R>(
        &self,
        work: impl FnOnce(&mut Connection) -> DbResult<R>,
    ) -> DbResult<R> {
        let mut guard = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        work(&mut guard)
    }
}
