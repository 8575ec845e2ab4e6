//! Bundled in-process SQLite connection.

use std::path::Path;

use indi_lang::{ResultSet, Row, Scalar};
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::info;

use super::SqlConnection;
use crate::adapter::BackendError;

/// A SQLite database behind a mutex, file-backed or in-memory.
pub struct SqliteConnection {
    inner: Mutex<Connection>,
}

impl SqliteConnection {
    /// Open (creating if needed) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| BackendError::Connection {
            message: format!("failed to open sqlite database {}: {e}", path.display()),
        })?;
        info!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            inner: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, BackendError> {
        let conn = Connection::open_in_memory().map_err(|e| BackendError::Connection {
            message: format!("failed to open in-memory sqlite database: {e}"),
        })?;
        Ok(Self {
            inner: Mutex::new(conn),
        })
    }

    /// Run a batch of DDL statements, typically table provisioning.
    pub fn provision(&self, ddl: &str) -> Result<(), BackendError> {
        self.inner.lock().execute_batch(ddl).map_err(Into::into)
    }

    fn decode_cell(cell: ValueRef<'_>) -> Option<Scalar> {
        match cell {
            ValueRef::Null => None,
            ValueRef::Integer(n) => Some(Scalar::Int(n)),
            ValueRef::Text(bytes) => {
                Some(Scalar::parse(&String::from_utf8_lossy(bytes)))
            }
            ValueRef::Real(f) => Some(Scalar::Text(f.to_string())),
            ValueRef::Blob(bytes) => {
                Some(Scalar::Text(String::from_utf8_lossy(bytes).into_owned()))
            }
        }
    }
}

impl SqlConnection for SqliteConnection {
    fn query(&self, sql: &str) -> Result<ResultSet, BackendError> {
        let conn = self.inner.lock();
        let mut stmt = conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query([])?;
        let mut out = ResultSet::new();
        while let Some(raw) = rows.next()? {
            let mut row = Row::default();
            for i in 0..column_count {
                row.push(Self::decode_cell(raw.get_ref(i)?));
            }
            out.push(row);
        }
        Ok(out)
    }

    fn execute(&self, sql: &str) -> Result<(), BackendError> {
        self.inner.lock().execute(sql, [])?;
        Ok(())
    }
}
