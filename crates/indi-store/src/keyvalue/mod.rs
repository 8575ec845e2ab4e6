//! Key-value adapter: emulates rows and columns over a flat key space.
//!
//! Layout, for a store configured with schema prefix `db0`:
//!
//! ```text
//! db0-fish_7_kind    one key per cell: {schema}-{table}_{pk}_{field}
//! db0-fish-NEXTPK    per-table primary-key counter, next value to assign
//! ```
//!
//! Every created row also gets an `id` cell holding its primary key, so
//! reads that request `id` resolve it like any other field. Deleting a row
//! removes its cell keys; the counter is never rewound, so primary keys are
//! never reused.

mod memory;

pub use memory::MemoryKv;

use indi_lang::{Predicate, ResultSet, Row, Scalar};
use tracing::debug;

use crate::adapter::{StoreAdapter, StoreResult};

/// Read surface of a key-value engine.
///
/// Scans used to emulate predicates take only this trait, which keeps them
/// from writing mid-plan.
pub trait KvRead: Send + Sync {
    /// Value stored at `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// All keys matching `pattern`, where `*` spans any run of characters.
    /// No order is guaranteed.
    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}

/// Write surface of a key-value engine.
pub trait KvWrite: Send + Sync {
    /// Store `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key` if present.
    fn del(&self, key: &str) -> StoreResult<()>;
}

/// A full key-value engine.
pub trait KvEngine: KvRead + KvWrite {}

impl<E: KvRead> KvRead for std::sync::Arc<E> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        (**self).keys(pattern)
    }
}

impl<E: KvWrite> KvWrite for std::sync::Arc<E> {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn del(&self, key: &str) -> StoreResult<()> {
        (**self).del(key)
    }
}

impl<E: KvEngine> KvEngine for std::sync::Arc<E> {}

/// Key-value store: the cell/counter emulation over a [`KvEngine`].
pub struct KvStore<E: KvEngine> {
    engine: E,
    schema: String,
}

impl<E: KvEngine> KvStore<E> {
    /// Wrap `engine`, prefixing every key with `schema`.
    pub fn new(engine: E, schema: impl Into<String>) -> Self {
        Self {
            engine,
            schema: schema.into(),
        }
    }

    /// Access the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn prefix(&self, table: &str) -> String {
        format!("{}-{}", self.schema, table)
    }

    fn cell_key(&self, table: &str, pk: i64, field: &str) -> String {
        format!("{}_{}_{}", self.prefix(table), pk, field)
    }

    fn counter_key(&self, table: &str) -> String {
        format!("{}-NEXTPK", self.prefix(table))
    }

    /// Next primary key for `table`; 1 when the counter has never been set.
    fn next_pk(&self, table: &str) -> StoreResult<i64> {
        Ok(self
            .engine
            .get(&self.counter_key(table))?
            .and_then(|v| v.parse().ok())
            .unwrap_or(1))
    }

    fn extract_pk(key: &str, prefix: &str) -> Option<i64> {
        let rest = key.strip_prefix(prefix)?.strip_prefix('_')?;
        rest.split('_').next()?.parse().ok()
    }

    /// Primary keys of rows whose `field` cell equals `value`, ascending.
    fn matching_pks(&self, table: &str, field: &str, value: &Scalar) -> StoreResult<Vec<i64>> {
        let prefix = self.prefix(table);
        let wanted = value.as_text();
        let mut pks = Vec::new();
        for key in self.engine.keys(&format!("{prefix}_*_{field}"))? {
            if let Some(stored) = self.engine.get(&key)? {
                if stored == wanted {
                    if let Some(pk) = Self::extract_pk(&key, &prefix) {
                        pks.push(pk);
                    }
                }
            }
        }
        pks.sort_unstable();
        Ok(pks)
    }

    /// Primary keys a predicate selects, or `None` for every possible row.
    fn target_pks(&self, table: &str, predicate: &Predicate) -> StoreResult<Option<Vec<i64>>> {
        match predicate {
            Predicate::All => Ok(None),
            Predicate::Equals { field, value } if field == "id" => {
                Ok(Some(value.as_int().into_iter().collect()))
            }
            Predicate::Equals { field, value } => {
                Ok(Some(self.matching_pks(table, field, value)?))
            }
        }
    }

    fn read_row(&self, table: &str, pk: i64, fields: &[String]) -> StoreResult<Row> {
        let mut row = Row::default();
        for field in fields {
            let cell = self.engine.get(&self.cell_key(table, pk, field))?;
            row.push(cell.map(|v| Scalar::parse(&v)));
        }
        Ok(row)
    }

    fn write_row(
        &self,
        table: &str,
        pk: i64,
        fields: &[String],
        values: &[Scalar],
    ) -> StoreResult<()> {
        for (field, value) in fields.iter().zip(values.iter()) {
            self.engine
                .set(&self.cell_key(table, pk, field), &value.as_text())?;
        }
        Ok(())
    }

    fn delete_row(&self, table: &str, pk: i64) -> StoreResult<()> {
        let pattern = format!("{}_{pk}_*", self.prefix(table));
        for key in self.engine.keys(&pattern)? {
            self.engine.del(&key)?;
        }
        Ok(())
    }
}

impl<E: KvEngine> StoreAdapter for KvStore<E> {
    fn read(&self, table: &str, predicate: &Predicate, fields: &[String]) -> StoreResult<ResultSet> {
        debug!(table, ?predicate, "key-value read");
        let pks = match self.target_pks(table, predicate)? {
            Some(pks) => pks,
            None => (1..self.next_pk(table)?).collect(),
        };
        let mut out = ResultSet::new();
        for pk in pks {
            let row = self.read_row(table, pk, fields)?;
            if !row.is_all_null() {
                out.push(row);
            }
        }
        Ok(out)
    }

    fn create(&self, table: &str, fields: &[String], values: &[Scalar]) -> StoreResult<()> {
        let pk = self.next_pk(table)?;
        debug!(table, pk, "key-value create");
        self.engine
            .set(&self.counter_key(table), &(pk + 1).to_string())?;
        self.write_row(table, pk, fields, values)?;
        self.engine
            .set(&self.cell_key(table, pk, "id"), &pk.to_string())
    }

    fn update(
        &self,
        table: &str,
        predicate: &Predicate,
        fields: &[String],
        values: &[Scalar],
    ) -> StoreResult<()> {
        debug!(table, ?predicate, "key-value update");
        let pks = match self.target_pks(table, predicate)? {
            Some(pks) => pks,
            None => (1..self.next_pk(table)?).collect(),
        };
        for pk in pks {
            self.write_row(table, pk, fields, values)?;
        }
        Ok(())
    }

    fn delete(&self, table: &str, predicate: &Predicate) -> StoreResult<()> {
        debug!(table, ?predicate, "key-value delete");
        match self.target_pks(table, predicate)? {
            Some(pks) => {
                for pk in pks {
                    self.delete_row(table, pk)?;
                }
            }
            None => {
                // Whole-table delete: drop every cell but keep the counter.
                for key in self.engine.keys(&format!("{}_*", self.prefix(table)))? {
                    self.engine.del(&key)?;
                }
            }
        }
        Ok(())
    }

    fn find_primary_keys(
        &self,
        table: &str,
        field: &str,
        value: &Scalar,
    ) -> StoreResult<Vec<i64>> {
        self.matching_pks(table, field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> KvStore<MemoryKv> {
        KvStore::new(MemoryKv::new(), "db0")
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn eq(field: &str, value: Scalar) -> Predicate {
        Predicate::Equals {
            field: field.to_string(),
            value,
        }
    }

    #[test]
    fn test_create_assigns_ascending_pks_and_id_cell() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("carp")])
            .unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["id", "kind"]))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(1)));
        assert_eq!(rows[1].get(0), Some(&Scalar::Int(2)));
        assert_eq!(rows[1].get(1), Some(&Scalar::from("carp")));
    }

    #[test]
    fn test_read_by_field_predicate() {
        let store = store();
        for kind in ["bass", "carp", "bass"] {
            store
                .create("fish", &fields(&["kind"]), &[Scalar::from(kind)])
                .unwrap();
        }
        let rows = store
            .read("fish", &eq("kind", Scalar::from("bass")), &fields(&["id"]))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(1)));
        assert_eq!(rows[1].get(0), Some(&Scalar::Int(3)));
    }

    #[test]
    fn test_read_missing_id_returns_no_rows() {
        let store = store();
        let rows = store
            .read("fish", &eq("id", Scalar::Int(42)), &fields(&["kind"]))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_matching_pks_sort_numerically_past_ten() {
        let store = store();
        for _ in 0..11 {
            store
                .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
                .unwrap();
        }
        let pks = store
            .find_primary_keys("fish", "kind", &Scalar::from("bass"))
            .unwrap();
        assert_eq!(pks, (1..=11).collect::<Vec<i64>>());
    }

    #[test]
    fn test_delete_keeps_counter() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store.delete("fish", &eq("id", Scalar::Int(1))).unwrap();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("carp")])
            .unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["id"]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_whole_table_delete_preserves_counter() {
        let store = store();
        for _ in 0..3 {
            store
                .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
                .unwrap();
        }
        store.delete("fish", &Predicate::All).unwrap();
        assert!(store
            .read("fish", &Predicate::All, &fields(&["id"]))
            .unwrap()
            .is_empty());

        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("carp")])
            .unwrap();
        let rows = store
            .read("fish", &Predicate::All, &fields(&["id"]))
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(4)));
    }

    #[test]
    fn test_update_by_id_writes_blindly() {
        let store = store();
        store
            .update(
                "fish",
                &eq("id", Scalar::Int(5)),
                &fields(&["kind"]),
                &[Scalar::from("ghost")],
            )
            .unwrap();
        // No id cell was ever written, so the orphan cells stay invisible to
        // whole-table reads but resolve by direct id lookup.
        let rows = store
            .read("fish", &eq("id", Scalar::Int(5)), &fields(&["kind"]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Scalar::from("ghost")));
    }

    #[test]
    fn test_update_by_field_predicate_no_match_is_noop() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store
            .update(
                "fish",
                &eq("kind", Scalar::from("carp")),
                &fields(&["kind"]),
                &[Scalar::from("eel")],
            )
            .unwrap();
        let rows = store
            .read("fish", &Predicate::All, &fields(&["kind"]))
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Scalar::from("bass")));
    }

    #[test]
    fn test_digit_string_cells_read_back_as_integers() {
        let store = store();
        store
            .create("fish", &fields(&["weight"]), &[Scalar::Int(7)])
            .unwrap();
        let rows = store
            .read("fish", &Predicate::All, &fields(&["weight"]))
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(7)));
    }
}
