//! Entity key types and key assignment.
//!
//! # Responsibility
//! - Define which Rust types can identify an entity.
//! - Decide how a fresh key is produced for a new entity.
//!
//! # Invariants
//! - A key equal to `Default::default()` means "not yet persisted".
//! - Backend-assigned keys (`from_row_id`) and client-generated keys
//!   (`generate`) are mutually exclusive per key type.

use super::value::{FromValue, Value};
use chrono::Utc;
use std::fmt::{Debug, Display};
use uuid::Uuid;

/// Capability required from an entity key.
pub trait Key: Clone + Default + PartialEq + Debug + Display + Send + Sync + 'static {
    /// Encodes the key as a bindable cell.
    fn to_value(&self) -> Value;

    /// Decodes a stored key cell.
    fn from_value(value: &Value) -> Option<Self>;

    /// Returns whether this key is the unassigned value.
    fn is_unset(&self) -> bool {
        *self == Self::default()
    }

    /// Produces a key on the client before insert, when the type supports it.
    fn generate() -> Option<Self> {
        None
    }

    /// Maps a backend-assigned row id (SQLite rowid) onto the key type.
    fn from_row_id(_row_id: i64) -> Option<Self> {
        None
    }
}

impl Key for i32 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        <i32 as FromValue>::from_value(value)
    }

    fn from_row_id(row_id: i64) -> Option<Self> {
        i32::try_from(row_id).ok()
    }
}

impl Key for i64 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        <i64 as FromValue>::from_value(value)
    }

    fn from_row_id(row_id: i64) -> Option<Self> {
        Some(row_id)
    }
}

impl Key for Uuid {
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        <Uuid as FromValue>::from_value(value)
    }

    fn generate() -> Option<Self> {
        Some(comb_uuid())
    }
}

impl Key for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        <String as FromValue>::from_value(value)
    }

    fn generate() -> Option<Self> {
        Some(comb_uuid().to_string())
    }
}

/// Generates a COMB UUID: random leading half, time-ordered trailing half.
///
/// Stores that index on the trailing bytes (SQL Server, most B-tree layouts)
/// see near-sequential inserts instead of random page splits.
pub fn comb_uuid() -> Uuid {
    let mut bytes = *Uuid::new_v4().as_bytes();
    let micros = Utc::now().timestamp_micros().to_be_bytes();
    bytes[8..].copy_from_slice(&micros);
    Uuid::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::{comb_uuid, Key};
    use uuid::Uuid;

    #[test]
    fn default_keys_are_unset() {
        assert!(0i32.is_unset());
        assert!(0i64.is_unset());
        assert!(String::new().is_unset());
        assert!(Uuid::nil().is_unset());
        assert!(!7i32.is_unset());
    }

    #[test]
    fn integer_keys_are_backend_assigned() {
        assert_eq!(i32::generate(), None);
        assert_eq!(i32::from_row_id(12), Some(12));
        assert_eq!(i32::from_row_id(i64::MAX), None);
        assert_eq!(Uuid::from_row_id(12), None);
    }

    #[test]
    fn comb_uuids_sort_by_creation_time_in_trailing_bytes() {
        let first = comb_uuid();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = comb_uuid();

        assert_ne!(first, second);
        assert!(first.as_bytes()[8..] < second.as_bytes()[8..]);
        assert!(!Uuid::generate().unwrap().is_unset());
    }
}
