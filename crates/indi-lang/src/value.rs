//! Scalar and row value model.
//!
//! Every backend stores only two scalar kinds: integers and strings. A token
//! that parses fully as an integer is coerced to `Int`; this coercion decides
//! whether SQL text quotes the literal, and it is re-applied when decoding
//! cells from every backend so the cross-store equality check compares
//! normalized values regardless of native storage class.

use std::collections::BTreeSet;
use std::fmt;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

/// A single INDI scalar: an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// An integer value.
    Int(i64),
    /// A string value.
    Text(String),
}

impl Scalar {
    /// Parses a token, coercing to `Int` when it parses fully as an integer.
    pub fn parse(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Text(token.to_string()),
        }
    }

    /// Returns the unquoted textual form (used for key-value cells and
    /// client-side equality comparison).
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Returns the value as an integer, if it is one.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns true if this scalar is an integer.
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One row of a result set: one nullable cell per requested field, in
/// request order.
///
/// A row in which every cell is null denotes a deleted or never-written
/// record and is dropped from result sets by the adapters, never returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    cells: Vec<Option<Scalar>>,
}

impl Row {
    /// Creates a row from its cells.
    pub fn new(cells: Vec<Option<Scalar>>) -> Self {
        Self { cells }
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true if every cell is null (or the row is empty).
    pub fn is_all_null(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Returns the cell at `index`.
    pub fn get(&self, index: usize) -> Option<&Scalar> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Appends a cell.
    pub fn push(&mut self, cell: Option<Scalar>) {
        self.cells.push(cell);
    }

    /// Returns the cells as a slice.
    pub fn cells(&self) -> &[Option<Scalar>] {
        &self.cells
    }

    /// Iterates over the cells.
    pub fn iter(&self) -> impl Iterator<Item = &Option<Scalar>> {
        self.cells.iter()
    }
}

impl From<Vec<Option<Scalar>>> for Row {
    fn from(cells: Vec<Option<Scalar>>) -> Self {
        Self::new(cells)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match cell {
                Some(v) => write!(f, "{v}")?,
                None => write!(f, "null")?,
            }
        }
        write!(f, ")")
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cells.len()))?;
        for cell in &self.cells {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

/// An ordered sequence of rows. Backends must agree on the final row order
/// (ascending by primary key) for the cross-store equality check to pass.
pub type ResultSet = Vec<Row>;

/// The set of primary keys a statement touches.
///
/// The reserved key `0` denotes "the entire table" and is used by the cache
/// to mark whole-table reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrimaryKeySet {
    keys: BTreeSet<i64>,
}

impl PrimaryKeySet {
    /// The reserved key meaning "the whole table".
    pub const WHOLE_TABLE: i64 = 0;

    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the whole-table marker set `{0}`.
    pub fn whole_table() -> Self {
        let mut keys = BTreeSet::new();
        keys.insert(Self::WHOLE_TABLE);
        Self { keys }
    }

    /// Returns true if this is the whole-table marker.
    pub fn is_whole_table(&self) -> bool {
        self.keys.len() == 1 && self.keys.contains(&Self::WHOLE_TABLE)
    }

    /// Inserts a key.
    pub fn insert(&mut self, pk: i64) {
        self.keys.insert(pk);
    }

    /// Returns true if `pk` is in the set.
    pub fn contains(&self, pk: i64) -> bool {
        self.keys.contains(&pk)
    }

    /// Returns true if the two sets share any key.
    pub fn intersects(&self, other: &Self) -> bool {
        self.keys.iter().any(|k| other.keys.contains(k))
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over the keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.keys.iter().copied()
    }
}

impl FromIterator<i64> for PrimaryKeySet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PrimaryKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, k) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Scalar::parse("42"), Scalar::Int(42));
        assert_eq!(Scalar::parse("-7"), Scalar::Int(-7));
        assert_eq!(Scalar::parse("4x2"), Scalar::Text("4x2".to_string()));
        assert_eq!(Scalar::parse(""), Scalar::Text(String::new()));
    }

    #[test]
    fn test_scalar_text_form() {
        assert_eq!(Scalar::Int(5).as_text(), "5");
        assert_eq!(Scalar::Text("abc".into()).as_text(), "abc");
    }

    #[test]
    fn test_row_all_null() {
        assert!(Row::new(vec![None, None]).is_all_null());
        assert!(Row::new(vec![]).is_all_null());
        assert!(!Row::new(vec![None, Some(Scalar::Int(1))]).is_all_null());
    }

    #[test]
    fn test_row_serialize() {
        let row = Row::new(vec![Some(Scalar::Text("x".into())), None, Some(Scalar::Int(3))]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["x",null,3]"#);
    }

    #[test]
    fn test_pk_set_whole_table() {
        let whole = PrimaryKeySet::whole_table();
        assert!(whole.is_whole_table());
        assert!(whole.contains(PrimaryKeySet::WHOLE_TABLE));

        let mut set = PrimaryKeySet::new();
        set.insert(0);
        set.insert(3);
        assert!(!set.is_whole_table());
    }

    #[test]
    fn test_pk_set_intersects() {
        let a: PrimaryKeySet = [1, 2, 3].into_iter().collect();
        let b: PrimaryKeySet = [3, 9].into_iter().collect();
        let c: PrimaryKeySet = [4].into_iter().collect();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_pk_set_ordered_iteration() {
        let set: PrimaryKeySet = [9, 1, 4].into_iter().collect();
        let keys: Vec<i64> = set.iter().collect();
        assert_eq!(keys, vec![1, 4, 9]);
    }
}
