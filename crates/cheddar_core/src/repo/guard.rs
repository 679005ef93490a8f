//! Initialization guard shared by every adapter.
//!
//! # Invariants
//! - Every contract operation calls [`ensure_initialized`] before touching
//!   its backend.
//! - The flag is only raised after a successful connectivity check.

use super::error::{RepoError, RepoResult};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};

/// Readiness of an adapter instance.
pub trait Readiness {
    fn is_initialized(&self) -> bool;
}

/// Fails with `NotInitialized` unless `adapter` is ready.
///
/// The error records `operation` and the `file:line` of the call site.
#[track_caller]
pub fn ensure_initialized<A: Readiness + ?Sized>(
    adapter: &A,
    operation: &'static str,
) -> RepoResult<()> {
    if adapter.is_initialized() {
        return Ok(());
    }

    let caller = Location::caller();
    let location = format!("{}:{}", caller.file(), caller.line());
    log::warn!(
        "event=guard_reject module=repo status=error operation={operation} location={location}"
    );
    Err(RepoError::NotInitialized {
        operation,
        location,
    })
}

/// Atomic initialized flag embedded in adapters.
#[derive(Debug, Default)]
pub struct InitFlag(AtomicBool);

impl InitFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}
