//! Append-only audit log for mutating statements.
//!
//! One record file per statement, named by nanosecond timestamp, written
//! before the statement is dispatched to any store. The engine never reads
//! the log back; it exists for external replay and disaster recovery.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Sink for the raw text of mutating statements.
pub trait AuditLog: Send + Sync {
    /// Persist one statement. A failure here aborts the statement before
    /// dispatch.
    fn record(&self, statement: &str) -> io::Result<()>;
}

/// File-backed audit log: one `indi_<nanos>` file per statement.
pub struct FileAuditLog {
    dir: PathBuf,
}

impl FileAuditLog {
    /// Create the log, creating `dir` if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    fn timestamp_nanos() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, statement: &str) -> io::Result<()> {
        let path = self.dir.join(format!("indi_{}", Self::timestamp_nanos()));
        debug!(path = %path.display(), "audit record");
        std::fs::write(&path, format!("{statement}\n"))
    }
}

/// Discards every record; for tests and embedded use.
pub struct NoopAuditLog;

impl AuditLog for NoopAuditLog {
    fn record(&self, _statement: &str) -> io::Result<()> {
        Ok(())
    }
}
