//! Structured INDI statements.

use std::fmt;

use crate::value::Scalar;

/// The four INDI verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Query rows.
    Read,
    /// Insert a row, assigning the next primary key.
    Create,
    /// Modify fields of matching rows.
    Update,
    /// Remove matching rows.
    Delete,
}

impl Verb {
    /// Parses a verb token, case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "READ" => Some(Self::Read),
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns true for CREATE/UPDATE/DELETE.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Read)
    }

    /// Returns the canonical keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The row-selection condition of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `ALL RECORDS` — the full current key range of the table.
    All,
    /// A single equality condition on one field.
    Equals {
        /// The field name.
        field: String,
        /// The value to match.
        value: Scalar,
    },
}

impl Predicate {
    /// Returns true for `ALL RECORDS`.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns true if the predicate targets the `id` field directly.
    ///
    /// An `id` predicate is already resolved: adapters use the value as the
    /// primary key without a scan.
    #[must_use]
    pub fn is_id(&self) -> bool {
        matches!(self, Self::Equals { field, .. } if field == "id")
    }
}

/// A parsed INDI statement.
///
/// `fields` and `values` are significant in order and paired positionally;
/// the parser guarantees equal lengths for CREATE/UPDATE. The verbatim
/// source text is retained — it is the cache key and the audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// The verb.
    pub verb: Verb,
    /// The target table.
    pub table: String,
    /// The row-selection predicate. CREATE statements have none and carry
    /// [`Predicate::All`] here by convention (they touch no existing row).
    pub predicate: Predicate,
    /// Requested (READ) or assigned (CREATE/UPDATE) field names, in order.
    pub fields: Vec<String>,
    /// Values paired positionally with `fields` (CREATE/UPDATE only).
    pub values: Vec<Scalar>,
    /// The verbatim statement text.
    pub text: String,
}

impl Statement {
    /// Returns `(field, value)` pairs for CREATE/UPDATE.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Cheap pre-screen: does `text` loosely resemble an INDI statement?
///
/// Request façades use this to reject non-INDI payloads before parsing. It
/// only checks that the first token is a verb and the second is `IN`; it does
/// not validate the full grammar.
pub fn looks_like_indi(text: &str) -> bool {
    let mut tokens = text.split_whitespace();
    let verb_ok = tokens.next().is_some_and(|t| Verb::from_token(t).is_some());
    let in_ok = tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("IN"));
    verb_ok && in_ok
}
