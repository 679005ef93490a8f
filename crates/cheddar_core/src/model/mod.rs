//! Entity data model shared by every backend adapter.
//!
//! # Responsibility
//! - Define what a record must expose to be stored (`DataModel`, `Entity`).
//! - Provide backend-neutral values, rows and key types.
//!
//! # Invariants
//! - Every stored record is identified by exactly one key column.
//! - The key type's default value means "new, not yet persisted".

pub mod entity;
pub mod key;
pub mod row;
pub mod value;
