//! The backend-agnostic repository contract.
//!
//! # Invariants
//! - Every operation except `initialize` and `close` fails with
//!   `NotInitialized` until `initialize` has succeeded.
//! - Insert vs update is decided by key presence alone: an unset key inserts
//!   (and the assigned key is written back), a set key updates by key.
//! - Backend errors are surfaced unchanged in kind; nothing is retried.

use super::error::RepoResult;
use super::guard::Readiness;
use crate::model::entity::Entity;
use crate::query::filter::Filter;
use async_trait::async_trait;

/// Uniform CRUD surface over one entity type stored in one backend.
#[async_trait]
pub trait Repository<T: Entity>: Readiness + Send + Sync {
    /// Establishes (or re-validates) backend connectivity.
    ///
    /// On failure the repository is left uninitialized.
    async fn initialize(&self) -> RepoResult<()>;

    /// Returns the entity with `id`, or `None` when absent.
    async fn get_by_id(&self, id: &T::Key) -> RepoResult<Option<T>>;

    /// Returns entities matching `filter`, in backend order.
    async fn get(&self, filter: &Filter) -> RepoResult<Vec<T>>;

    /// Returns every entity. Unbounded; page or cache at the call site for
    /// large tables.
    async fn get_all(&self) -> RepoResult<Vec<T>>;

    /// Inserts when `entity`'s key is unset, otherwise replaces the stored
    /// entity with the same key.
    ///
    /// A new entity carrying a hand-picked non-default key is treated as an
    /// update.
    async fn insert_or_update(&self, entity: &mut T) -> RepoResult<()>;

    /// Removes the entity with `id`. Missing-key behavior is adapter-defined.
    async fn delete(&self, id: &T::Key) -> RepoResult<()>;

    /// Clears the initialized state and releases the backend session.
    async fn close(&self) -> RepoResult<()>;

    /// Explicit transaction capability, when the backend has one.
    ///
    /// Not part of the portable surface: code relying on it is bound to a
    /// transactional backend.
    fn transactions(&self) -> Option<&dyn TransactionSupport> {
        None
    }
}

/// Adapter-specific transaction scoping.
#[async_trait]
pub trait TransactionSupport: Send + Sync {
    /// Opens a transaction joined by every later operation on this backend
    /// until the handle is committed, rolled back or dropped (rollback).
    async fn begin(&self) -> RepoResult<Box<dyn TransactionHandle>>;
}

/// An open transaction.
#[async_trait]
pub trait TransactionHandle: Send {
    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}
