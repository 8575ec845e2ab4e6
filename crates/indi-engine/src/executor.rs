//! Multi-store fan-out and the consistency check.
//!
//! A statement dispatched to "all" runs on every enabled adapter; the
//! per-store results must be deeply equal (same rows, same order, same cell
//! values and types) or the statement fails with a [`ConsistencyFault`]. The
//! fault is the core promise of the engine: it is never resolved by picking
//! a majority or the first store's answer. Nothing already written is rolled
//! back; a fault means the deployment needs operator intervention.

use indi_lang::{Predicate, PrimaryKeySet, ResultSet, Row, Statement, Verb};
use indi_store::StoreAdapter;
use tracing::{info, warn};

use crate::error::{ConsistencyFault, EngineError, EngineResult};
use crate::stores::{StoreName, StoreSet};

/// Fan-out executor over a store set.
pub(crate) struct Executor<'a> {
    stores: &'a StoreSet,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(stores: &'a StoreSet) -> Self {
        Self { stores }
    }

    /// Run `statement` on one adapter. Mutations yield an empty result set.
    fn run_on(
        &self,
        name: StoreName,
        adapter: &dyn StoreAdapter,
        statement: &Statement,
    ) -> EngineResult<ResultSet> {
        let outcome = match statement.verb {
            Verb::Read => {
                adapter.read(&statement.table, &statement.predicate, &statement.fields)
            }
            Verb::Create => adapter
                .create(&statement.table, &statement.fields, &statement.values)
                .map(|()| ResultSet::new()),
            Verb::Update => adapter
                .update(
                    &statement.table,
                    &statement.predicate,
                    &statement.fields,
                    &statement.values,
                )
                .map(|()| ResultSet::new()),
            Verb::Delete => adapter
                .delete(&statement.table, &statement.predicate)
                .map(|()| ResultSet::new()),
        };
        outcome.map_err(|source| EngineError::Backend {
            store: name,
            statement: statement.text.clone(),
            source,
        })
    }

    /// Dispatch to every enabled store and check agreement.
    pub(crate) fn execute_all(&self, statement: &Statement) -> EngineResult<ResultSet> {
        info!(statement = %statement.text, stores = self.stores.len(), "dispatch");
        let mut baseline: Option<(StoreName, ResultSet)> = None;
        for (name, adapter) in self.stores.iter() {
            let result = self.run_on(name, adapter, statement)?;
            match &baseline {
                None => baseline = Some((name, result)),
                Some((first_name, first)) if *first != result => {
                    warn!(
                        statement = %statement.text,
                        baseline = %first_name,
                        divergent = %name,
                        "stores disagree"
                    );
                    return Err(ConsistencyFault {
                        statement: statement.text.clone(),
                        baseline: *first_name,
                        baseline_result: render_rows(first),
                        divergent: name,
                        divergent_result: render_rows(&result),
                    }
                    .into());
                }
                Some(_) => {}
            }
        }
        // StoreSet::open guarantees at least one store.
        Ok(baseline.map(|(_, rows)| rows).unwrap_or_default())
    }

    /// Dispatch to a single named store, skipping the consistency check.
    pub(crate) fn execute_single(
        &self,
        name: StoreName,
        statement: &Statement,
    ) -> EngineResult<ResultSet> {
        let adapter = self
            .stores
            .get(name)
            .ok_or(EngineError::StoreNotEnabled { store: name })?;
        info!(statement = %statement.text, store = %name, "dispatch to single store");
        self.run_on(name, adapter, statement)
    }

    /// Resolve the primary keys `statement` touches.
    ///
    /// All-records statements touch the whole table and resolve to `{0}`
    /// without contacting any store. Equality predicates probe every store
    /// through `find_primary_keys`; the per-store key lists must agree, so
    /// the resolver itself can raise a [`ConsistencyFault`].
    pub(crate) fn resolve_affected_keys(
        &self,
        statement: &Statement,
    ) -> EngineResult<PrimaryKeySet> {
        let (field, value) = match &statement.predicate {
            Predicate::All => return Ok(PrimaryKeySet::whole_table()),
            Predicate::Equals { field, value } => (field, value),
        };

        let mut baseline: Option<(StoreName, Vec<i64>)> = None;
        for (name, adapter) in self.stores.iter() {
            let keys = adapter
                .find_primary_keys(&statement.table, field, value)
                .map_err(|source| EngineError::Backend {
                    store: name,
                    statement: statement.text.clone(),
                    source,
                })?;
            match &baseline {
                None => baseline = Some((name, keys)),
                Some((first_name, first)) if *first != keys => {
                    warn!(
                        statement = %statement.text,
                        baseline = %first_name,
                        divergent = %name,
                        "primary key resolution disagrees"
                    );
                    return Err(ConsistencyFault {
                        statement: statement.text.clone(),
                        baseline: *first_name,
                        baseline_result: format!("{first:?}"),
                        divergent: name,
                        divergent_result: format!("{keys:?}"),
                    }
                    .into());
                }
                Some(_) => {}
            }
        }
        Ok(baseline
            .map(|(_, keys)| keys.into_iter().collect())
            .unwrap_or_default())
    }
}

fn render_rows(rows: &[Row]) -> String {
    let rendered: Vec<String> = rows.iter().map(Row::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
