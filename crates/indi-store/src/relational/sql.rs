//! Statement-to-SQL translation.
//!
//! The relational adapter is a thin shell around these pure functions; they
//! render one SQL statement per operation with no trailing semicolon.
//! Reads always carry `ORDER BY id ASC` so every relational engine returns
//! rows in the same order the emulated stores produce them.

use indi_lang::{Predicate, Scalar};

/// String-literal escaping rules for the target relational engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite: double embedded single quotes.
    Sqlite,
    /// MySQL: double single quotes and escape backslashes.
    MySql,
    /// PostgreSQL: double embedded single quotes.
    Postgres,
}

impl Dialect {
    /// Escape `raw` for inclusion inside a single-quoted literal.
    #[must_use]
    pub fn escape_string(&self, raw: &str) -> String {
        match self {
            Dialect::Sqlite | Dialect::Postgres => raw.replace('\'', "''"),
            Dialect::MySql => raw.replace('\\', "\\\\").replace('\'', "''"),
        }
    }

    fn literal(&self, value: &Scalar) -> String {
        match value {
            Scalar::Int(n) => n.to_string(),
            Scalar::Text(s) => format!("'{}'", self.escape_string(s)),
        }
    }

    fn where_clause(&self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::All => String::new(),
            Predicate::Equals { field, value } => {
                format!(" WHERE {} = {}", field, self.literal(value))
            }
        }
    }
}

/// `SELECT` for a read, ordered by primary key.
#[must_use]
pub fn select(dialect: Dialect, table: &str, predicate: &Predicate, fields: &[String]) -> String {
    format!(
        "SELECT {} FROM {}{} ORDER BY id ASC",
        fields.join(", "),
        table,
        dialect.where_clause(predicate)
    )
}

/// `INSERT` for a create; the primary key column is left to the engine.
#[must_use]
pub fn insert(dialect: Dialect, table: &str, fields: &[String], values: &[Scalar]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| dialect.literal(v)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        fields.join(", "),
        rendered.join(", ")
    )
}

/// `UPDATE` for an update; an all-rows predicate omits the `WHERE` clause.
#[must_use]
pub fn update(
    dialect: Dialect,
    table: &str,
    predicate: &Predicate,
    fields: &[String],
    values: &[Scalar],
) -> String {
    let assignments: Vec<String> = fields
        .iter()
        .zip(values.iter())
        .map(|(f, v)| format!("{} = {}", f, dialect.literal(v)))
        .collect();
    format!(
        "UPDATE {} SET {}{}",
        table,
        assignments.join(", "),
        dialect.where_clause(predicate)
    )
}

/// `DELETE` for a delete; an all-rows predicate omits the `WHERE` clause.
#[must_use]
pub fn delete(dialect: Dialect, table: &str, predicate: &Predicate) -> String {
    format!("DELETE FROM {}{}", table, dialect.where_clause(predicate))
}

/// `SELECT id` probe used by the primary-key resolver.
///
/// The probe value is always rendered as a quoted string; engines with
/// column affinity (and the emulated stores, which hold text) still match
/// integer columns.
#[must_use]
pub fn select_primary_keys(dialect: Dialect, table: &str, field: &str, value: &Scalar) -> String {
    let quoted = format!("'{}'", dialect.escape_string(&value.as_text()));
    format!(
        "SELECT id FROM {} WHERE {} = {} ORDER BY id ASC",
        table, field, quoted
    )
}
