//! Document adapter: emulates rows and columns over one document per cell.
//!
//! A row in table `fish` with primary key 7 and fields `kind`, `weight`
//! becomes three documents in the group `fish`:
//!
//! ```text
//! { group: "fish", id: "7", field: "id",     value: 7      }
//! { group: "fish", id: "7", field: "kind",   value: "bass" }
//! { group: "fish", id: "7", field: "weight", value: 4      }
//! ```
//!
//! Document ids are strings; the `id` cell document makes id lookups work
//! through the same field/value filter as any other predicate. The per-group
//! primary-key counter lives outside the document space and survives deletes.

mod memory;

pub use memory::MemoryDoc;

use indi_lang::{Predicate, ResultSet, Row, Scalar};
use tracing::debug;

use crate::adapter::{StoreAdapter, StoreResult};

/// One cell document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Group name, the INDI table.
    pub group: String,
    /// Row primary key, stored as text.
    pub id: String,
    /// Field name within the row.
    pub field: String,
    /// Cell value.
    pub value: Scalar,
}

/// A conjunctive filter over documents; `None` components match anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFilter {
    /// Group to match.
    pub group: String,
    /// Row id to match, if constrained.
    pub id: Option<String>,
    /// Field name to match, if constrained.
    pub field: Option<String>,
    /// Cell value to match, if constrained.
    pub value: Option<Scalar>,
}

impl DocFilter {
    /// Filter matching every document in `group`.
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            id: None,
            field: None,
            value: None,
        }
    }

    /// Constrain the row id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Constrain the field name.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Constrain the cell value.
    #[must_use]
    pub fn value(mut self, value: Scalar) -> Self {
        self.value = Some(value);
        self
    }

    /// True if `document` satisfies every constrained component.
    pub fn matches(&self, document: &Document) -> bool {
        document.group == self.group
            && self.id.as_ref().map_or(true, |id| *id == document.id)
            && self.field.as_ref().map_or(true, |f| *f == document.field)
            && self.value.as_ref().map_or(true, |v| *v == document.value)
    }
}

/// Driver surface of a document engine.
pub trait DocEngine: Send + Sync {
    /// Store a new document.
    fn insert(&self, document: Document) -> StoreResult<()>;

    /// All documents matching `filter`. No order is guaranteed.
    fn find(&self, filter: &DocFilter) -> StoreResult<Vec<Document>>;

    /// Set `value` on every document matching `filter`, inserting one from
    /// the filter's components when none matches.
    fn upsert(&self, filter: &DocFilter, value: Scalar) -> StoreResult<()>;

    /// Remove every document matching `filter`.
    fn delete_many(&self, filter: &DocFilter) -> StoreResult<()>;

    /// Next primary key for `group`; 1 when never advanced.
    fn next_pk(&self, group: &str) -> StoreResult<i64>;

    /// Advance the primary-key counter for `group`.
    fn set_next_pk(&self, group: &str, next_pk: i64) -> StoreResult<()>;
}

impl<E: DocEngine> DocEngine for std::sync::Arc<E> {
    fn insert(&self, document: Document) -> StoreResult<()> {
        (**self).insert(document)
    }

    fn find(&self, filter: &DocFilter) -> StoreResult<Vec<Document>> {
        (**self).find(filter)
    }

    fn upsert(&self, filter: &DocFilter, value: Scalar) -> StoreResult<()> {
        (**self).upsert(filter, value)
    }

    fn delete_many(&self, filter: &DocFilter) -> StoreResult<()> {
        (**self).delete_many(filter)
    }

    fn next_pk(&self, group: &str) -> StoreResult<i64> {
        (**self).next_pk(group)
    }

    fn set_next_pk(&self, group: &str, next_pk: i64) -> StoreResult<()> {
        (**self).set_next_pk(group, next_pk)
    }
}

/// Document store: the cell-per-document emulation over a [`DocEngine`].
pub struct DocStore<E: DocEngine> {
    engine: E,
}

impl<E: DocEngine> DocStore<E> {
    /// Wrap `engine`.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Access the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Primary keys of rows with a cell matching field/value, ascending.
    fn matching_pks(&self, table: &str, field: &str, value: &Scalar) -> StoreResult<Vec<i64>> {
        let filter = DocFilter::group(table).field(field).value(value.clone());
        let mut pks: Vec<i64> = self
            .engine
            .find(&filter)?
            .iter()
            .filter_map(|d| d.id.parse().ok())
            .collect();
        pks.sort_unstable();
        pks.dedup();
        Ok(pks)
    }

    fn read_row(&self, table: &str, pk: i64, fields: &[String]) -> StoreResult<Row> {
        let cells = self.engine.find(&DocFilter::group(table).id(pk.to_string()))?;
        let mut row = Row::default();
        for field in fields {
            let cell = cells.iter().find(|d| d.field == *field);
            row.push(cell.map(|d| d.value.clone()));
        }
        Ok(row)
    }
}

impl<E: DocEngine> StoreAdapter for DocStore<E> {
    fn read(&self, table: &str, predicate: &Predicate, fields: &[String]) -> StoreResult<ResultSet> {
        debug!(table, ?predicate, "document read");
        let pks = match predicate {
            Predicate::All => (1..self.engine.next_pk(table)?).collect(),
            Predicate::Equals { field, value } => self.matching_pks(table, field, value)?,
        };
        let mut out = ResultSet::new();
        for pk in pks {
            let row = self.read_row(table, pk, fields)?;
            if !row.is_empty() && !row.is_all_null() {
                out.push(row);
            }
        }
        Ok(out)
    }

    fn create(&self, table: &str, fields: &[String], values: &[Scalar]) -> StoreResult<()> {
        let pk = self.engine.next_pk(table)?;
        debug!(table, pk, "document create");
        self.engine.set_next_pk(table, pk + 1)?;
        let id = pk.to_string();
        self.engine.insert(Document {
            group: table.to_string(),
            id: id.clone(),
            field: "id".to_string(),
            value: Scalar::Int(pk),
        })?;
        for (field, value) in fields.iter().zip(values.iter()) {
            self.engine.insert(Document {
                group: table.to_string(),
                id: id.clone(),
                field: field.clone(),
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    fn update(
        &self,
        table: &str,
        predicate: &Predicate,
        fields: &[String],
        values: &[Scalar],
    ) -> StoreResult<()> {
        debug!(table, ?predicate, "document update");
        let pks: Vec<i64> = match predicate {
            Predicate::All => (1..self.engine.next_pk(table)?).collect(),
            Predicate::Equals { field, value } if field == "id" => {
                value.as_int().into_iter().collect()
            }
            Predicate::Equals { field, value } => self.matching_pks(table, field, value)?,
        };
        for pk in pks {
            for (field, value) in fields.iter().zip(values.iter()) {
                let filter = DocFilter::group(table).id(pk.to_string()).field(field.clone());
                self.engine.upsert(&filter, value.clone())?;
            }
        }
        Ok(())
    }

    fn delete(&self, table: &str, predicate: &Predicate) -> StoreResult<()> {
        debug!(table, ?predicate, "document delete");
        let filter = match predicate {
            Predicate::All => DocFilter::group(table),
            Predicate::Equals { field, value } if field == "id" => {
                DocFilter::group(table).id(value.as_text())
            }
            // Deletes only the matching cell documents; sibling cells of the
            // row survive and its id document keeps it visible to reads.
            Predicate::Equals { field, value } => DocFilter::group(table)
                .field(field.clone())
                .value(value.clone()),
        };
        self.engine.delete_many(&filter)
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

    fn store() -> DocStore<MemoryDoc> {
        DocStore::new(MemoryDoc::new())
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
    fn test_create_then_read_all_records() {
        let store = store();
        store
            .create(
                "fish",
                &fields(&["kind", "weight"]),
                &[Scalar::from("bass"), Scalar::Int(4)],
            )
            .unwrap();
        store
            .create(
                "fish",
                &fields(&["kind", "weight"]),
                &[Scalar::from("carp"), Scalar::Int(9)],
            )
            .unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["id", "kind", "weight"]))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(1)));
        assert_eq!(rows[0].get(1), Some(&Scalar::from("bass")));
        assert_eq!(rows[1].get(2), Some(&Scalar::Int(9)));
    }

    #[test]
    fn test_read_by_id_goes_through_id_document() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        let rows = store
            .read("fish", &eq("id", Scalar::Int(1)), &fields(&["kind"]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Scalar::from("bass")));
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        let rows = store
            .read("fish", &Predicate::All, &fields(&["kind", "weight"]))
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Scalar::from("bass")));
        assert_eq!(rows[0].get(1), None);
    }

    #[test]
    fn test_deleted_row_dropped_from_all_records() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("carp")])
            .unwrap();
        store.delete("fish", &eq("id", Scalar::Int(1))).unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["id", "kind"]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_pk_counter_survives_whole_table_delete() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store.delete("fish", &Predicate::All).unwrap();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("carp")])
            .unwrap();

        let rows = store
            .read("fish", &Predicate::All, &fields(&["id"]))
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Scalar::Int(2)));
    }

    #[test]
    fn test_update_by_field_predicate() {
        let store = store();
        for kind in ["bass", "carp", "bass"] {
            store
                .create("fish", &fields(&["kind"]), &[Scalar::from(kind)])
                .unwrap();
        }
        store
            .update(
                "fish",
                &eq("kind", Scalar::from("bass")),
                &fields(&["kind"]),
                &[Scalar::from("eel")],
            )
            .unwrap();

        let pks = store
            .find_primary_keys("fish", "kind", &Scalar::from("eel"))
            .unwrap();
        assert_eq!(pks, vec![1, 3]);
    }

    #[test]
    fn test_update_by_id_upserts_missing_cells() {
        let store = store();
        store
            .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
            .unwrap();
        store
            .update(
                "fish",
                &eq("id", Scalar::Int(1)),
                &fields(&["weight"]),
                &[Scalar::Int(4)],
            )
            .unwrap();

        let rows = store
            .read("fish", &eq("id", Scalar::Int(1)), &fields(&["kind", "weight"]))
            .unwrap();
        assert_eq!(rows[0].get(1), Some(&Scalar::Int(4)));
    }

    #[test]
    fn test_non_id_delete_removes_only_matching_cells() {
        let store = store();
        store
            .create(
                "fish",
                &fields(&["kind", "weight"]),
                &[Scalar::from("bass"), Scalar::Int(4)],
            )
            .unwrap();
        store
            .delete("fish", &eq("kind", Scalar::from("bass")))
            .unwrap();

        // The weight cell and the id document survive.
        let rows = store
            .read("fish", &Predicate::All, &fields(&["kind", "weight"]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), None);
        assert_eq!(rows[0].get(1), Some(&Scalar::Int(4)));
    }

    #[test]
    fn test_find_primary_keys_sorted_numerically() {
        let store = store();
        for _ in 0..12 {
            store
                .create("fish", &fields(&["kind"]), &[Scalar::from("bass")])
                .unwrap();
        }
        let pks = store
            .find_primary_keys("fish", "kind", &Scalar::from("bass"))
            .unwrap();
        assert_eq!(pks, (1..=12).collect::<Vec<i64>>());
    }
}
