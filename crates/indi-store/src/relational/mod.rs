//! Relational adapter: renders statements to SQL and runs them over a
//! [`SqlConnection`].
//!
//! The adapter itself is engine-agnostic. [`sqlite::SqliteConnection`] is the
//! bundled in-process engine; external MySQL or PostgreSQL clients plug in by
//! implementing [`SqlConnection`] with the matching [`Dialect`].

mod sql;
pub mod sqlite;

pub use sql::Dialect;
pub use sqlite::SqliteConnection;

use indi_lang::{Predicate, ResultSet, Scalar};
use tracing::debug;

use crate::adapter::{BackendError, StoreAdapter, StoreResult};

/// Minimal driver surface the relational adapter needs.
///
/// `query` is for statements that return rows, `execute` for statements run
/// for effect. Write statements must go through `execute` so driver failures
/// surface instead of being lost in an unread row iterator.
pub trait SqlConnection: Send + Sync {
    /// Run `sql` and decode every returned row.
    fn query(&self, sql: &str) -> Result<ResultSet, BackendError>;

    /// Run `sql` for its side effect.
    fn execute(&self, sql: &str) -> Result<(), BackendError>;
}

impl<C: SqlConnection> SqlConnection for std::sync::Arc<C> {
    fn query(&self, sql: &str) -> Result<ResultSet, BackendError> {
        (**self).query(sql)
    }

    fn execute(&self, sql: &str) -> Result<(), BackendError> {
        (**self).execute(sql)
    }
}

/// A relational store: SQL translation plus a live connection.
pub struct RelationalStore<C: SqlConnection> {
    connection: C,
    dialect: Dialect,
}

impl<C: SqlConnection> RelationalStore<C> {
    /// Wrap `connection`, rendering SQL in the given `dialect`.
    pub fn new(connection: C, dialect: Dialect) -> Self {
        Self {
            connection,
            dialect,
        }
    }

    /// Access the underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }
}

impl<C: SqlConnection> StoreAdapter for RelationalStore<C> {
    fn read(&self, table: &str, predicate: &Predicate, fields: &[String]) -> StoreResult<ResultSet> {
        let sql = sql::select(self.dialect, table, predicate, fields);
        debug!(%sql, "relational read");
        let mut rows = self.connection.query(&sql)?;
        // A row whose selected cells are all NULL is treated as absent.
        rows.retain(|row| !row.is_all_null());
        Ok(rows)
    }

    fn create(&self, table: &str, fields: &[String], values: &[Scalar]) -> StoreResult<()> {
        let sql = sql::insert(self.dialect, table, fields, values);
        debug!(%sql, "relational create");
        self.connection.execute(&sql)
    }

    fn update(
        &self,
        table: &str,
        predicate: &Predicate,
        fields: &[String],
        values: &[Scalar],
    ) -> StoreResult<()> {
        let sql = sql::update(self.dialect, table, predicate, fields, values);
        debug!(%sql, "relational update");
        self.connection.execute(&sql)
    }

    fn delete(&self, table: &str, predicate: &Predicate) -> StoreResult<()> {
        let sql = sql::delete(self.dialect, table, predicate);
        debug!(%sql, "relational delete");
        self.connection.execute(&sql)
    }

    fn find_primary_keys(
        &self,
        table: &str,
        field: &str,
        value: &Scalar,
    ) -> StoreResult<Vec<i64>> {
        let sql = sql::select_primary_keys(self.dialect, table, field, value);
        debug!(%sql, "relational pk probe");
        let rows = self.connection.query(&sql)?;
        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            match row.get(0) {
                Some(Scalar::Int(pk)) => keys.push(*pk),
                other => {
                    return Err(BackendError::Sql {
                        message: format!("primary key probe returned non-integer cell: {other:?}"),
                    })
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indi_lang::Row;

    fn store() -> RelationalStore<SqliteConnection> {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.provision("CREATE TABLE fish (id INTEGER PRIMARY KEY AUTOINCREMENT, kind TEXT, weight TEXT)")
            .unwrap();
        RelationalStore::new(conn, Dialect::Sqlite)
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_then_read_round_trip() {
        let store = store();
        store
            .create(
                "fish",
                &fields(&["kind", "weight"]),
                &[Scalar::from("bass"), Scalar::Int(4)],
            )
            .unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["id", "kind", "weight"]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(1)));
        assert_eq!(rows[0].get(1), Some(&Scalar::from("bass")));
        assert_eq!(rows[0].get(2), Some(&Scalar::Int(4)));
    }

    #[test]
    fn test_update_by_predicate() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store
            .update(
                "fish",
                &Predicate::Equals {
                    field: "kind".to_string(),
                    value: Scalar::from("bass"),
                },
                &fields(&["kind"]),
                &[Scalar::from("carp")],
            )
            .unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["kind"]))
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Scalar::from("carp")));
    }

    #[test]
    fn test_delete_missing_row_is_noop() {
        let store = store();
        let result = store.delete(
            "fish",
            &Predicate::Equals {
                field: "id".to_string(),
                value: Scalar::Int(99),
            },
        );
        assert!(result.is_ok());
        let rows = store
            .read("fish", &Predicate::All, &fields(&["id"]))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_primary_keys_never_reused_after_delete() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store
            .delete(
                "fish",
                &Predicate::Equals {
                    field: "id".to_string(),
                    value: Scalar::Int(1),
                },
            )
            .unwrap();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("carp")])
            .unwrap();

        let keys = store
            .find_primary_keys("fish", "kind", &Scalar::from("carp"))
            .unwrap();
        assert_eq!(keys, vec![2]);
    }

    #[test]
    fn test_find_primary_keys_matches_integer_column_with_quoted_probe() {
        let store = store();
        for _ in 0..3 {
            store
                .create("fish", &fields(&["weight"]), &[Scalar::Int(7)])
                .unwrap();
        }
        let keys = store
            .find_primary_keys("fish", "weight", &Scalar::Int(7))
            .unwrap();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_cell_reads_as_none() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        let rows = store
            .read("fish", &Predicate::All, &fields(&["kind", "weight"]))
            .unwrap();
        assert_eq!(rows[0], Row::from(vec![Some(Scalar::from("bass")), None]));
    }

    #[test]
    fn test_read_drops_rows_with_only_null_cells() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        let rows = store
            .read("fish", &Predicate::All, &fields(&["weight"]))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_bad_sql_surfaces_backend_error() {
        let store = store();
        let err = store
            .read("no_such_table", &Predicate::All, &fields(&["id"]))
            .unwrap_err();
        assert!(matches!(err, BackendError::Sql { .. }));
    }
}
