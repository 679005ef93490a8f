//! Repository service facade.
//!
//! # Responsibility
//! - Give callers one entry point per entity type, independent of backend.
//! - Initialize the wrapped repository on first use.
//!
//! # Invariants
//! - `get_by_id` never returns an empty success: missing keys are `NotFound`.
//! - Every call emits one `event=service_call` log line with its duration.
//! - Lazy initialization runs at most once at a time across clones.

use crate::model::entity::{DataModel, Entity};
use crate::query::filter::Filter;
use crate::repo::{RepoError, RepoResult, Repository};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Backend-agnostic CRUD facade for entity type `T`.
///
/// Clones share the repository and its lazy-initialization lock.
pub struct RepositoryService<T: Entity> {
    repo: Arc<dyn Repository<T>>,
    init_lock: Arc<Mutex<()>>,
}

impl<T: Entity> Clone for RepositoryService<T> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            init_lock: Arc::clone(&self.init_lock),
        }
    }
}

impl<T: Entity> RepositoryService<T> {
    pub fn new(repo: Arc<dyn Repository<T>>) -> Self {
        Self {
            repo,
            init_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Wrapped repository, for adapter-specific capabilities.
    pub fn repository(&self) -> &Arc<dyn Repository<T>> {
        &self.repo
    }

    pub fn is_initialized(&self) -> bool {
        self.repo.is_initialized()
    }

    /// Initializes the wrapped repository unconditionally.
    pub async fn initialize(&self) -> RepoResult<()> {
        let started_at = Instant::now();
        let _guard = self.init_lock.lock().await;
        let result = self.repo.initialize().await;
        log_call::<T, _>("initialize", started_at, &result);
        result
    }

    /// Returns the entity with `id` or `NotFound`.
    pub async fn get_by_id(&self, id: &T::Key) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = match self.find(id).await {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => Err(RepoError::not_found(T::TABLE, id)),
            Err(err) => Err(err),
        };
        log_call::<T, _>("get_by_id", started_at, &result);
        result
    }

    /// Returns the entity with `id`, or `None` when absent.
    pub async fn find_by_id(&self, id: &T::Key) -> RepoResult<Option<T>> {
        let started_at = Instant::now();
        let result = self.find(id).await;
        log_call::<T, _>("find_by_id", started_at, &result);
        result
    }

    pub async fn get(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        let started_at = Instant::now();
        let result = match self.ensure_ready().await {
            Ok(()) => self.repo.get(filter).await,
            Err(err) => Err(err),
        };
        log_call::<T, _>("get", started_at, &result);
        result
    }

    pub async fn get_all(&self) -> RepoResult<Vec<T>> {
        let started_at = Instant::now();
        let result = match self.ensure_ready().await {
            Ok(()) => self.repo.get_all().await,
            Err(err) => Err(err),
        };
        log_call::<T, _>("get_all", started_at, &result);
        result
    }

    /// Persists `entity` and returns its key, newly assigned on insert.
    pub async fn insert_or_update(&self, entity: &mut T) -> RepoResult<T::Key> {
        let started_at = Instant::now();
        let result = match self.ensure_ready().await {
            Ok(()) => self
                .repo
                .insert_or_update(entity)
                .await
                .map(|()| entity.id().clone()),
            Err(err) => Err(err),
        };
        log_call::<T, _>("insert_or_update", started_at, &result);
        result
    }

    pub async fn delete(&self, id: &T::Key) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = match self.ensure_ready().await {
            Ok(()) => self.repo.delete(id).await,
            Err(err) => Err(err),
        };
        log_call::<T, _>("delete", started_at, &result);
        result
    }

    async fn find(&self, id: &T::Key) -> RepoResult<Option<T>> {
        self.ensure_ready().await?;
        self.repo.get_by_id(id).await
    }

    async fn ensure_ready(&self) -> RepoResult<()> {
        if self.repo.is_initialized() {
            return Ok(());
        }
        let _guard = self.init_lock.lock().await;
        if self.repo.is_initialized() {
            return Ok(());
        }
        self.repo.initialize().await
    }
}

fn log_call<T: Entity, R>(operation: &str, started_at: Instant, result: &RepoResult<R>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=service_call module=service status=ok entity={} op={} duration_ms={}",
            T::TABLE,
            operation,
            duration_ms
        ),
        Err(err) => warn!(
            "event=service_call module=service status=error entity={} op={} duration_ms={} error={}",
            T::TABLE,
            operation,
            duration_ms,
            err
        ),
    }
}
