//! Relational adapter over a shared SQLite connection.
//!
//! # Responsibility
//! - Implement the repository contract with keyed, filtered and full-table
//!   SQL statements.
//! - Offer explicit transactions as an adapter-specific capability.
//!
//! # Invariants
//! - Integer keys are assigned by SQLite (`last_insert_rowid`); UUID and
//!   string keys are generated before insert.
//! - `delete` of an unknown key fails with `NotFound`; no `DELETE` is issued.
//! - `insert_or_update` with a set key that matches no row fails with
//!   `NotFound` instead of inserting.
//! - After a successful write the entity holds exactly what a later read
//!   returns (timestamps truncated to microseconds).

use super::contract::{Repository, TransactionHandle, TransactionSupport};
use super::error::{RepoError, RepoResult};
use super::guard::{ensure_initialized, InitFlag, Readiness};
use crate::db::{read_row, stored_value, SqliteStore, SqliteTransaction};
use crate::model::entity::{DataModel, Entity};
use crate::model::key::Key;
use crate::model::row::Row;
use crate::query::filter::Filter;
use crate::query::sql::SqlStatement;
use async_trait::async_trait;
use log::{error, info};
use rusqlite::params_from_iter;
use std::marker::PhantomData;
use std::time::Instant;

/// SQLite-backed repository for entity type `T`.
pub struct SqliteRepository<T: Entity> {
    store: SqliteStore,
    ready: InitFlag,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> SqliteRepository<T> {
    /// Binds a repository to `store`. Call `initialize` before use.
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store,
            ready: InitFlag::default(),
            _entity: PhantomData,
        }
    }

    /// Underlying store handle.
    ///
    /// Exposed for test setup; application code going through this bypasses
    /// the repository contract.
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Opens an explicit transaction on the shared connection.
    pub async fn begin_transaction(&self) -> RepoResult<SqliteTransaction> {
        ensure_initialized(self, "begin_transaction")?;
        Ok(SqliteTransaction::begin(&self.store).await?)
    }

    async fn fetch(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        let statement = SqlStatement::select::<T>(filter)?;
        self.store
            .with_connection(move |conn| -> RepoResult<Vec<T>> {
                let mut stmt = conn.prepare(&statement.sql)?;
                let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
                let mut entities = Vec::new();
                while let Some(row) = rows.next()? {
                    entities.push(T::from_row(&read_row(row)?)?);
                }
                Ok(entities)
            })
            .await
    }

    async fn check_connectivity(&self) -> RepoResult<()> {
        self.store
            .probe()
            .await
            .map_err(|err| RepoError::Connectivity(err.to_string()))?;

        let probe = SqlStatement::schema_probe::<T>()?;
        self.store
            .with_connection(move |conn| -> RepoResult<()> {
                conn.prepare(&probe.sql)?;
                Ok(())
            })
            .await
    }

    async fn insert(&self, entity: &mut T) -> RepoResult<()> {
        let explicit_key = T::Key::generate();
        let row = entity.to_row();
        let mut stored = stored_entity::<T>(&T::Key::default(), &row)?;
        let statement =
            SqlStatement::insert::<T>(explicit_key.as_ref().map(Key::to_value), &row)?;
        let table = T::TABLE;

        let assigned = self
            .store
            .with_connection(move |conn| -> RepoResult<T::Key> {
                conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
                if let Some(key) = explicit_key {
                    return Ok(key);
                }

                let row_id = conn.last_insert_rowid();
                match T::Key::from_row_id(row_id) {
                    Some(key) => Ok(key),
                    None => {
                        conn.execute(&format!("DELETE FROM {table} WHERE rowid = ?1"), [row_id])?;
                        Err(RepoError::KeyAssignment { entity: table })
                    }
                }
            })
            .await?;

        stored.set_id(assigned);
        *entity = stored;
        Ok(())
    }

    async fn update(&self, entity: &mut T) -> RepoResult<()> {
        let key = entity.id().clone();
        let row = entity.to_row();
        let stored = stored_entity(&key, &row)?;
        let statement = SqlStatement::update::<T>(key.to_value(), &row)?;

        let changed = self
            .store
            .with_connection(move |conn| -> RepoResult<usize> {
                Ok(conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?)
            })
            .await?;

        if changed == 0 {
            return Err(RepoError::not_found(T::TABLE, key));
        }
        *entity = stored;
        Ok(())
    }
}

/// Rebuilds the entity the database will return for `key` and `row`.
fn stored_entity<T: Entity>(key: &T::Key, row: &Row) -> RepoResult<T> {
    let mut stored = Row::new().with(T::KEY_COLUMN, stored_value(&key.to_value())?);
    for (column, value) in row.iter() {
        stored.set(column, stored_value(value)?);
    }
    Ok(T::from_row(&stored)?)
}

impl<T: Entity> Readiness for SqliteRepository<T> {
    fn is_initialized(&self) -> bool {
        self.ready.is_set()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for SqliteRepository<T> {
    async fn initialize(&self) -> RepoResult<()> {
        let started_at = Instant::now();
        info!(
            "event=repo_init module=repo status=start backend=sqlite table={}",
            T::TABLE
        );

        match self.check_connectivity().await {
            Ok(()) => {
                self.ready.set();
                info!(
                    "event=repo_init module=repo status=ok backend=sqlite table={} duration_ms={}",
                    T::TABLE,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                self.ready.clear();
                error!(
                    "event=repo_init module=repo status=error backend=sqlite table={} duration_ms={} error={}",
                    T::TABLE,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    async fn get_by_id(&self, id: &T::Key) -> RepoResult<Option<T>> {
        ensure_initialized(self, "get_by_id")?;
        let mut found = self.fetch(&Filter::eq(T::KEY_COLUMN, id.to_value())).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    async fn get(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        ensure_initialized(self, "get")?;
        self.fetch(filter).await
    }

    async fn get_all(&self) -> RepoResult<Vec<T>> {
        ensure_initialized(self, "get_all")?;
        self.fetch(&Filter::all()).await
    }

    async fn insert_or_update(&self, entity: &mut T) -> RepoResult<()> {
        ensure_initialized(self, "insert_or_update")?;
        if entity.id().is_unset() {
            self.insert(entity).await
        } else {
            self.update(entity).await
        }
    }

    async fn delete(&self, id: &T::Key) -> RepoResult<()> {
        ensure_initialized(self, "delete")?;
        let lookup = SqlStatement::select::<T>(&Filter::eq(T::KEY_COLUMN, id.to_value()))?;
        let removal = SqlStatement::delete::<T>(id.to_value())?;

        let removed = self
            .store
            .with_connection(move |conn| -> RepoResult<bool> {
                let exists = conn
                    .prepare(&lookup.sql)?
                    .exists(params_from_iter(lookup.params.iter()))?;
                if !exists {
                    return Ok(false);
                }
                conn.execute(&removal.sql, params_from_iter(removal.params.iter()))?;
                Ok(true)
            })
            .await?;

        if removed {
            Ok(())
        } else {
            Err(RepoError::not_found(T::TABLE, id))
        }
    }

    async fn close(&self) -> RepoResult<()> {
        self.ready.clear();
        info!(
            "event=repo_close module=repo status=ok backend=sqlite table={}",
            T::TABLE
        );
        Ok(())
    }

    fn transactions(&self) -> Option<&dyn TransactionSupport> {
        Some(self)
    }
}

#[async_trait]
impl<T: Entity> TransactionSupport for SqliteRepository<T> {
    async fn begin(&self) -> RepoResult<Box<dyn TransactionHandle>> {
        Ok(Box::new(self.begin_transaction().await?))
    }
}

#[async_trait]
impl TransactionHandle for SqliteTransaction {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        Ok(SqliteTransaction::commit(*self).await?)
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(SqliteTransaction::rollback(*self).await?)
    }
}
