//! The adapter contract every backend implements.

use indi_lang::{Predicate, ResultSet, Scalar};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, BackendError>;

/// Errors raised by a backend after a connection has been established.
///
/// Each variant names the backend family that produced the failure so the
/// engine can report which member of a multi-store set faulted.
#[derive(Error, Debug)]
pub enum BackendError {
    /// A relational engine rejected a statement or a row failed to decode.
    #[error("sql backend error: {message}")]
    Sql {
        /// Driver-level description of the failure.
        message: String,
    },

    /// A key-value engine failed a get, set, scan, or delete.
    #[error("key-value backend error: {message}")]
    KeyValue {
        /// Driver-level description of the failure.
        message: String,
    },

    /// A document engine failed an insert, find, upsert, or delete.
    #[error("document backend error: {message}")]
    Document {
        /// Driver-level description of the failure.
        message: String,
    },

    /// The backend connection dropped mid-operation.
    #[error("backend connection lost: {message}")]
    Connection {
        /// Driver-level description of the failure.
        message: String,
    },
}

impl From<rusqlite::Error> for BackendError {
    fn from(err: rusqlite::Error) -> Self {
        BackendError::Sql {
            message: err.to_string(),
        }
    }
}

/// Uniform data-manipulation surface over a single backing store.
///
/// Implementations must present identical observable behavior for the same
/// sequence of calls: ascending primary-key row order on reads, primary keys
/// allocated from a per-table counter starting at 1 and never reused, and
/// missing cells surfaced as `None`.
pub trait StoreAdapter: Send + Sync {
    /// Read the requested `fields` from rows matching `predicate`, in
    /// ascending primary-key order.
    fn read(&self, table: &str, predicate: &Predicate, fields: &[String]) -> StoreResult<ResultSet>;

    /// Insert one row assigning `values` to `fields`; the primary key is
    /// allocated by the store.
    fn create(&self, table: &str, fields: &[String], values: &[Scalar]) -> StoreResult<()>;

    /// Assign `values` to `fields` on every row matching `predicate`.
    fn update(
        &self,
        table: &str,
        predicate: &Predicate,
        fields: &[String],
        values: &[Scalar],
    ) -> StoreResult<()>;

    /// Remove every row matching `predicate`.
    fn delete(&self, table: &str, predicate: &Predicate) -> StoreResult<()>;

    /// Primary keys of rows where `field` equals `value`, ascending.
    fn find_primary_keys(&self, table: &str, field: &str, value: &Scalar)
        -> StoreResult<Vec<i64>>;
}
