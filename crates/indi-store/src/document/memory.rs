//! Bundled in-process document engine.

use std::collections::HashMap;

use indi_lang::Scalar;
use parking_lot::RwLock;

use super::{DocEngine, DocFilter, Document};
use crate::adapter::StoreResult;

/// A flat collection of documents plus per-group primary-key counters,
/// each behind a read-write lock.
///
/// Stands in for an external document server; supports the insert, filter,
/// upsert and bulk-delete surface the adapter needs.
#[derive(Default)]
pub struct MemoryDoc {
    documents: RwLock<Vec<Document>>,
    counters: RwLock<HashMap<String, i64>>,
}

impl MemoryDoc {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live documents, counters excluded.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// True if no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocEngine for MemoryDoc {
    fn insert(&self, document: Document) -> StoreResult<()> {
        self.documents.write().push(document);
        Ok(())
    }

    fn find(&self, filter: &DocFilter) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    fn upsert(&self, filter: &DocFilter, value: Scalar) -> StoreResult<()> {
        let mut documents = self.documents.write();
        let mut touched = false;
        for doc in documents.iter_mut() {
            if filter.matches(doc) {
                doc.value = value.clone();
                touched = true;
            }
        }
        if !touched {
            documents.push(Document {
                group: filter.group.clone(),
                id: filter.id.clone().unwrap_or_default(),
                field: filter.field.clone().unwrap_or_default(),
                value,
            });
        }
        Ok(())
    }

    fn delete_many(&self, filter: &DocFilter) -> StoreResult<()> {
        self.documents.write().retain(|d| !filter.matches(d));
        Ok(())
    }

    fn next_pk(&self, group: &str) -> StoreResult<i64> {
        Ok(*self.counters.read().get(group).unwrap_or(&1))
    }

    fn set_next_pk(&self, group: &str, next_pk: i64) -> StoreResult<()> {
        self.counters.write().insert(group.to_string(), next_pk);
        Ok(())
    }
}
