//! Column-store adapter.
//!
//! # Responsibility
//! - Implement the repository contract with statements issued through a
//!   keyspace-bound session.
//!
//! # Invariants
//! - Keys are generated client-side (COMB UUIDs); key types the cluster
//!   cannot receive from the client fail with `KeyAssignment`.
//! - Updates are upserts and deletes of unknown keys are no-ops, as on the
//!   cluster itself. Consistency is whatever the cluster provides.
//! - After a successful write the entity holds the session's stored form of
//!   every cell.

use super::contract::Repository;
use super::error::{RepoError, RepoResult};
use super::guard::{ensure_initialized, InitFlag, Readiness};
use crate::column::{ClusterConnector, ColumnSession, Statement};
use crate::config::ColumnStoreConfig;
use crate::model::entity::{DataModel, Entity};
use crate::model::key::Key;
use crate::model::row::Row;
use crate::model::value::Value;
use crate::query::filter::Filter;
use crate::query::{validate_entity, validate_filter};
use async_trait::async_trait;
use log::{error, info};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Repository for `T` over a column-store cluster reached through `C`.
pub struct ColumnStoreRepository<T: Entity, C: ClusterConnector> {
    connector: C,
    config: ColumnStoreConfig,
    session: RwLock<Option<Arc<C::Session>>>,
    ready: InitFlag,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, C: ClusterConnector> ColumnStoreRepository<T, C> {
    /// Creates an unconnected repository. `initialize` opens the session.
    pub fn new(connector: C, config: ColumnStoreConfig) -> Self {
        Self {
            connector,
            config,
            session: RwLock::new(None),
            ready: InitFlag::default(),
            _entity: PhantomData,
        }
    }

    pub fn config(&self) -> &ColumnStoreConfig {
        &self.config
    }

    async fn session(&self) -> RepoResult<Arc<C::Session>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| RepoError::Connectivity("session was closed".to_string()))
    }

    async fn select(&self, filter: Filter) -> RepoResult<Vec<T>> {
        validate_entity::<T>()?;
        validate_filter::<T>(&filter)?;

        let statement = Statement::Select {
            table: T::TABLE,
            key_column: T::KEY_COLUMN,
            columns: std::iter::once(T::KEY_COLUMN)
                .chain(T::COLUMNS.iter().copied())
                .collect(),
            filter,
        };
        let rows = self.session().await?.query(&statement).await?;
        rows.iter()
            .map(|row| T::from_row(row).map_err(RepoError::from))
            .collect()
    }

    async fn mutate(&self, statement: Statement) -> RepoResult<()> {
        validate_entity::<T>()?;
        self.session().await?.execute(&statement).await?;
        Ok(())
    }

    /// Writes `entity` under `key` and returns it as the store will read it
    /// back.
    async fn upsert(&self, key: T::Key, entity: &T, fresh: bool) -> RepoResult<T> {
        validate_entity::<T>()?;
        let session = self.session().await?;
        let row = project(entity);

        let mut stored_row =
            Row::new().with(T::KEY_COLUMN, session.stored_value(&key.to_value())?);
        for (column, value) in row.iter() {
            stored_row.set(column, session.stored_value(value)?);
        }
        let stored = T::from_row(&stored_row)?;

        let statement = if fresh {
            Statement::Insert {
                table: T::TABLE,
                key_column: T::KEY_COLUMN,
                key: key.to_value(),
                row,
            }
        } else {
            Statement::Update {
                table: T::TABLE,
                key_column: T::KEY_COLUMN,
                key: key.to_value(),
                row,
            }
        };
        session.execute(&statement).await?;
        Ok(stored)
    }
}

/// Non-key cells of `entity`, in `COLUMNS` order.
fn project<T: Entity>(entity: &T) -> Row {
    let source = entity.to_row();
    T::COLUMNS
        .iter()
        .map(|column| {
            let value = source.get(column).cloned().unwrap_or(Value::Null);
            (column.to_string(), value)
        })
        .collect()
}

impl<T: Entity, C: ClusterConnector> Readiness for ColumnStoreRepository<T, C> {
    fn is_initialized(&self) -> bool {
        self.ready.is_set()
    }
}

#[async_trait]
impl<T, C> Repository<T> for ColumnStoreRepository<T, C>
where
    T: Entity,
    C: ClusterConnector + 'static,
{
    async fn initialize(&self) -> RepoResult<()> {
        let started_at = Instant::now();
        info!(
            "event=repo_init module=repo status=start backend=column_store contact_point={} keyspace={} table={}",
            self.config.contact_point,
            self.config.keyspace,
            T::TABLE
        );

        let connected = self
            .connector
            .connect(&self.config.contact_point, &self.config.keyspace)
            .await;

        match connected {
            Ok(session) => {
                *self.session.write().await = Some(Arc::new(session));
                self.ready.set();
                info!(
                    "event=repo_init module=repo status=ok backend=column_store table={} duration_ms={}",
                    T::TABLE,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                self.ready.clear();
                self.session.write().await.take();
                error!(
                    "event=repo_init module=repo status=error backend=column_store table={} duration_ms={} error={}",
                    T::TABLE,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    async fn get_by_id(&self, id: &T::Key) -> RepoResult<Option<T>> {
        ensure_initialized(self, "get_by_id")?;
        let mut found = self
            .select(Filter::eq(T::KEY_COLUMN, id.to_value()))
            .await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    async fn get(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        ensure_initialized(self, "get")?;
        self.select(filter.clone()).await
    }

    async fn get_all(&self) -> RepoResult<Vec<T>> {
        ensure_initialized(self, "get_all")?;
        self.select(Filter::all()).await
    }

    async fn insert_or_update(&self, entity: &mut T) -> RepoResult<()> {
        ensure_initialized(self, "insert_or_update")?;

        *entity = if entity.id().is_unset() {
            let key = T::Key::generate().ok_or(RepoError::KeyAssignment { entity: T::TABLE })?;
            self.upsert(key, entity, true).await?
        } else {
            self.upsert(entity.id().clone(), entity, false).await?
        };
        Ok(())
    }

    async fn delete(&self, id: &T::Key) -> RepoResult<()> {
        ensure_initialized(self, "delete")?;
        self.mutate(Statement::Delete {
            table: T::TABLE,
            key_column: T::KEY_COLUMN,
            key: id.to_value(),
        })
        .await
    }

    async fn close(&self) -> RepoResult<()> {
        self.ready.clear();
        self.session.write().await.take();
        info!(
            "event=repo_close module=repo status=ok backend=column_store table={}",
            T::TABLE
        );
        Ok(())
    }
}
