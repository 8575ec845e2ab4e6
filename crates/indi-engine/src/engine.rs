//! The top-level engine handle.
//!
//! `Indi` owns the store set, the query cache and the audit log. It assumes
//! at most one in-flight statement mutates a given table at a time; callers
//! serialize statements per table (primary-key agreement across backends
//! depends on it). Cross-table statements are independent.

use indi_lang::{Parser, Predicate, PrimaryKeySet, ResultSet, Statement, Verb};
use tracing::info;

use crate::audit::{AuditLog, FileAuditLog, NoopAuditLog};
use crate::cache::{CacheStats, QueryCache};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::executor::Executor;
use crate::stores::{StoreName, StoreSet};

/// Where a statement executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every enabled store, consistency-checked; the default.
    All,
    /// One named store, unchecked and uncached. The caller accepts
    /// responsibility for re-synchronizing the other stores afterwards.
    Store(StoreName),
}

/// A running INDI engine.
pub struct Indi {
    stores: StoreSet,
    cache: QueryCache,
    cache_enabled: bool,
    audit: Box<dyn AuditLog>,
}

impl Indi {
    /// Open the engine from configuration: connect every enabled store,
    /// build the cache, set up the audit log. Fails fast on the first store
    /// that cannot be initialized.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let stores = StoreSet::open(&config.stores)?;
        let audit: Box<dyn AuditLog> = if config.audit.enabled {
            Box::new(FileAuditLog::new(&config.audit.dir)?)
        } else {
            Box::new(NoopAuditLog)
        };
        info!(
            stores = ?stores.names(),
            cache = config.cache.enabled,
            audit = config.audit.enabled,
            "engine open"
        );
        Ok(Self {
            stores,
            cache: QueryCache::new(&config.tables),
            cache_enabled: config.cache.enabled,
            audit,
        })
    }

    /// Evaluate one INDI statement against all enabled stores.
    pub fn evaluate(&self, text: &str) -> EngineResult<ResultSet> {
        self.evaluate_on(text, Target::All)
    }

    /// Evaluate one INDI statement against `target`.
    ///
    /// Single-store targets bypass the cache entirely, on both the read and
    /// the invalidation side: a targeted mutation leaves the others stale by
    /// definition, and the cache answers for the checked view only.
    pub fn evaluate_on(&self, text: &str, target: Target) -> EngineResult<ResultSet> {
        let statement = Parser::parse(text)?;
        let executor = Executor::new(&self.stores);

        let name = match target {
            Target::All => {
                return self.evaluate_all(&executor, &statement);
            }
            Target::Store(name) => name,
        };
        executor.execute_single(name, &statement)
    }

    fn evaluate_all(&self, executor: &Executor<'_>, statement: &Statement) -> EngineResult<ResultSet> {
        match statement.verb {
            Verb::Read => self.read_through_cache(executor, statement),
            Verb::Create => {
                self.cache.evict_whole_table_reads(&statement.table);
                self.audited_execute(executor, statement)
            }
            Verb::Update | Verb::Delete => {
                let affected = self.affected_keys(executor, statement)?;
                // Eviction happens before dispatch: even if the execute
                // fails partway, no stale entry survives.
                self.cache.evict_intersecting(&statement.table, &affected);
                self.audited_execute(executor, statement)
            }
        }
    }

    fn read_through_cache(
        &self,
        executor: &Executor<'_>,
        statement: &Statement,
    ) -> EngineResult<ResultSet> {
        if !self.cache_enabled {
            return executor.execute_all(statement);
        }
        if let Some(rows) = self.cache.get(&statement.table, &statement.text) {
            return Ok(rows);
        }
        let affected = self.affected_keys(executor, statement)?;
        let rows = executor.execute_all(statement)?;
        self.cache
            .insert(&statement.table, &statement.text, affected, rows.clone());
        Ok(rows)
    }

    fn affected_keys(
        &self,
        executor: &Executor<'_>,
        statement: &Statement,
    ) -> EngineResult<PrimaryKeySet> {
        match &statement.predicate {
            Predicate::All => Ok(PrimaryKeySet::whole_table()),
            Predicate::Equals { .. } => executor.resolve_affected_keys(statement),
        }
    }

    fn audited_execute(
        &self,
        executor: &Executor<'_>,
        statement: &Statement,
    ) -> EngineResult<ResultSet> {
        self.audit.record(&statement.text)?;
        executor.execute_all(statement)
    }

    /// Run a batch of DDL against the relational store, if one is enabled.
    /// Schema provisioning is otherwise outside the engine's scope.
    pub fn provision(&self, ddl: &str) -> EngineResult<()> {
        if let Some(sqlite) = self.stores.sqlite() {
            sqlite.provision(ddl).map_err(|source| EngineError::Backend {
                store: StoreName::Sqlite3,
                statement: ddl.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// The enabled stores.
    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cheap pre-screen used by request façades before full parsing.
    pub fn looks_like_indi(text: &str) -> bool {
        indi_lang::looks_like_indi(text)
    }
}
