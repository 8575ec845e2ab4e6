//! # indi-engine
//!
//! The multi-store INDI engine: parses a statement once, executes it against
//! every enabled backend, and insists all of them agree.
//!
//! ```no_run
//! use indi_engine::{EngineConfig, Indi};
//!
//! # fn main() -> Result<(), indi_engine::EngineError> {
//! let indi = Indi::open(EngineConfig::for_testing())?;
//! indi.evaluate("CREATE IN nonsense FIELDS (a, b, c) VALUES (\"big\", \"scare\", \"today\")")?;
//! let rows = indi.evaluate("READ IN nonsense id 1 FIELDS (a, b, c)")?;
//! assert_eq!(rows[0].to_string(), "(big, scare, today)");
//! # Ok(())
//! # }
//! ```
//!
//! Reads flow through a statement-text-keyed cache with primary-key-scoped
//! invalidation; mutating statements are persisted to an audit log before
//! any store sees them.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod audit;
mod cache;
mod config;
mod engine;
mod error;
mod executor;
mod stores;

pub use audit::{AuditLog, FileAuditLog, NoopAuditLog};
pub use cache::{CacheStats, QueryCache};
pub use config::{
    AuditConfig, CacheConfig, DocConfig, EngineConfig, KvConfig, SqlServerConfig, SqliteConfig,
    StoresConfig,
};
pub use engine::{Indi, Target};
pub use error::{ConnectionError, ConsistencyFault, EngineError, EngineResult};
pub use stores::{StoreName, StoreSet};
