//! Query cache with primary-key-scoped invalidation.
//!
//! Entries are keyed by exact statement text, sharded per table. Each entry
//! remembers the primary keys its result depends on; the reserved key `0`
//! marks a whole-table read. Mutations evict by key intersection:
//!
//! - CREATE evicts the table's whole-table entries (a new row makes any
//!   "all records" read stale) and nothing else.
//! - UPDATE/DELETE evict entries whose key set intersects the statement's
//!   affected keys, plus the whole-table entries. A whole-table mutation
//!   drops the entire shard.
//!
//! Eviction is O(affected keys × entries for the table); both are small in
//! practice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use indi_lang::{PrimaryKeySet, ResultSet};
use parking_lot::RwLock;
use tracing::debug;

/// One memoized read: the result and the keys it depends on.
#[derive(Debug, Clone)]
struct CacheEntry {
    affected: PrimaryKeySet,
    result: ResultSet,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that had to execute.
    pub misses: u64,
    /// Entries stored.
    pub insertions: u64,
    /// Entries removed by invalidation.
    pub evictions: u64,
}

/// Statement-text-keyed result cache, sharded per table.
pub struct QueryCache {
    tables: RwLock<HashMap<String, HashMap<String, CacheEntry>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl QueryCache {
    /// Create a cache pre-sized for the given table registry. Tables outside
    /// the registry still get shards, allocated on first insert.
    pub fn new(tables: &[String]) -> Self {
        let mut map = HashMap::with_capacity(tables.len());
        for table in tables {
            map.insert(table.clone(), HashMap::new());
        }
        Self {
            tables: RwLock::new(map),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a statement's cached result.
    pub fn get(&self, table: &str, statement: &str) -> Option<ResultSet> {
        let tables = self.tables.read();
        let hit = tables
            .get(table)
            .and_then(|shard| shard.get(statement))
            .map(|entry| entry.result.clone());
        match &hit {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(table, statement, "cache hit");
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(table, statement, "cache miss");
            }
        }
        hit
    }

    /// Memoize a read result under its exact statement text.
    pub fn insert(
        &self,
        table: &str,
        statement: &str,
        affected: PrimaryKeySet,
        result: ResultSet,
    ) {
        let mut tables = self.tables.write();
        tables
            .entry(table.to_string())
            .or_default()
            .insert(statement.to_string(), CacheEntry { affected, result });
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// CREATE invalidation: drop the table's whole-table entries.
    pub fn evict_whole_table_reads(&self, table: &str) -> usize {
        let mut tables = self.tables.write();
        let Some(shard) = tables.get_mut(table) else {
            return 0;
        };
        let before = shard.len();
        shard.retain(|_, entry| !entry.affected.is_whole_table());
        let evicted = before - shard.len();
        self.note_evictions(table, evicted);
        evicted
    }

    /// UPDATE/DELETE invalidation: drop entries touching any affected key.
    pub fn evict_intersecting(&self, table: &str, affected: &PrimaryKeySet) -> usize {
        let mut tables = self.tables.write();
        let Some(shard) = tables.get_mut(table) else {
            return 0;
        };
        let before = shard.len();
        if affected.is_whole_table() {
            shard.clear();
        } else {
            shard.retain(|_, entry| {
                !entry.affected.is_whole_table() && !entry.affected.intersects(affected)
            });
        }
        let evicted = before - shard.len();
        self.note_evictions(table, evicted);
        evicted
    }

    /// Number of live entries across all tables.
    pub fn len(&self) -> usize {
        self.tables.read().values().map(HashMap::len).sum()
    }

    /// True if no entry is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn note_evictions(&self, table: &str, evicted: usize) {
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(table, evicted, "cache invalidation");
        }
    }
}
