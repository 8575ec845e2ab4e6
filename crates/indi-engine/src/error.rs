//! Engine error taxonomy.
//!
//! `ParseError` rejects a statement before any store is touched.
//! `ConnectionError` is fatal at startup for the deployment. `BackendError`
//! wraps a single adapter failure with the store and statement that produced
//! it. `ConsistencyFault` means the stores disagree and the deployment needs
//! operator intervention; it is always surfaced, never resolved by picking a
//! majority. A cache miss is a control path, not an error.

use indi_lang::ParseError;
use indi_store::BackendError;
use thiserror::Error;

use crate::stores::StoreName;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A configured store could not be initialized.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The store is configured but no client driver is bundled for it.
    #[error("no driver available for configured store '{store}'")]
    DriverUnavailable {
        /// The store that cannot be served.
        store: StoreName,
    },

    /// The store's driver failed to open a connection.
    #[error("failed to open store '{store}': {message}")]
    Open {
        /// The store that failed.
        store: StoreName,
        /// Driver-level description of the failure.
        message: String,
    },

    /// The configuration enables no store at all.
    #[error("no store is enabled in the configuration")]
    NoStores,
}

/// Two stores returned different results for the same statement.
///
/// Carries the statement text and both stores' rendered results so the
/// divergence can be reproduced and repaired by hand.
#[derive(Error, Debug)]
#[error(
    "consistency fault on `{statement}`: store '{baseline}' returned {baseline_result}, \
     store '{divergent}' returned {divergent_result}"
)]
pub struct ConsistencyFault {
    /// The statement whose results diverged.
    pub statement: String,
    /// The first store consulted.
    pub baseline: StoreName,
    /// Rendered result from the baseline store.
    pub baseline_result: String,
    /// The store that disagreed.
    pub divergent: StoreName,
    /// Rendered result from the disagreeing store.
    pub divergent_result: String,
}

/// Top-level engine error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The statement is not valid INDI.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A configured store could not be initialized.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// One adapter failed while executing a statement.
    #[error("store '{store}' failed on `{statement}`: {source}")]
    Backend {
        /// The store that failed.
        store: StoreName,
        /// The statement being executed.
        statement: String,
        /// The adapter-level failure.
        source: BackendError,
    },

    /// The stores disagree.
    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),

    /// The audit record could not be persisted; the mutation was not
    /// dispatched.
    #[error("audit log write failed: {source}")]
    Audit {
        /// The underlying I/O failure.
        #[from]
        source: std::io::Error,
    },

    /// A single-store target named a store that is not enabled.
    #[error("store '{store}' is not enabled")]
    StoreNotEnabled {
        /// The requested store.
        store: StoreName,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was wrong with it.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_fault_names_both_stores() {
        let fault = ConsistencyFault {
            statement: "READ IN fish ALL RECORDS FIELDS (kind)".to_string(),
            baseline: StoreName::Sqlite3,
            baseline_result: "[(bass)]".to_string(),
            divergent: StoreName::Redis,
            divergent_result: "[]".to_string(),
        };
        let text = fault.to_string();
        assert!(text.contains("sqlite3"));
        assert!(text.contains("redis"));
        assert!(text.contains("READ IN fish"));
    }

    #[test]
    fn test_parse_error_converts() {
        let err: EngineError = ParseError::MissingToken { expected: "IN" }.into();
        assert!(matches!(err, EngineError::Parse(_)));
    }
}
