//! Bundled in-process key-value engine.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{KvEngine, KvRead, KvWrite};
use crate::adapter::StoreResult;

/// A flat string-to-string map behind a read-write lock.
///
/// Stands in for an external key-value server; supports the same `GET`,
/// `SET`, `DEL` and wildcard `KEYS` surface the adapter needs.
#[derive(Default)]
pub struct MemoryKv {
    map: RwLock<BTreeMap<String, String>>,
}

impl MemoryKv {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, counters included.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

/// Glob-style match where `*` spans any run of characters.
fn wildcard_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }
    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

impl KvRead for MemoryKv {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .map
            .read()
            .keys()
            .filter(|k| wildcard_match(pattern, k))
            .cloned()
            .collect())
    }
}

impl KvWrite for MemoryKv {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn del(&self, key: &str) -> StoreResult<()> {
        self.map.write().remove(key);
        Ok(())
    }
}

impl KvEngine for MemoryKv {}
