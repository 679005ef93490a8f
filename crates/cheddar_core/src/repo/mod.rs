//! Repository contract, initialization guard and backend adapters.
//!
//! # Responsibility
//! - Define the storage-agnostic CRUD contract application code depends on.
//! - Bind it to SQLite and to a column-store cluster.
//!
//! # Invariants
//! - Every contract operation checks the initialization guard first.
//! - Repository APIs return semantic errors (`NotFound`, `NotInitialized`)
//!   in addition to backend transport errors.

pub mod column_repo;
pub mod contract;
pub mod error;
pub mod guard;
pub mod sqlite_repo;

pub use column_repo::ColumnStoreRepository;
pub use contract::{Repository, TransactionHandle, TransactionSupport};
pub use error::{RepoError, RepoResult};
pub use guard::{ensure_initialized, InitFlag, Readiness};
pub use sqlite_repo::SqliteRepository;
