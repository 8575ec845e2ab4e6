//! Store registry: opens the configured adapters once and holds them for the
//! engine's lifetime.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indi_store::document::{DocStore, MemoryDoc};
use indi_store::keyvalue::{KvStore, MemoryKv};
use indi_store::relational::{Dialect, RelationalStore, SqliteConnection};
use indi_store::StoreAdapter;
use tracing::info;

use crate::config::StoresConfig;
use crate::error::ConnectionError;

/// The five store names the configuration recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreName {
    /// Bundled SQLite.
    Sqlite3,
    /// MySQL (external driver required).
    MySql,
    /// PostgreSQL (external driver required).
    Postgres,
    /// Key-value store.
    Redis,
    /// Document store.
    MongoDb,
}

impl StoreName {
    /// The configuration-file spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite3 => "sqlite3",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Redis => "redis",
            Self::MongoDb => "mongodb",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite3),
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            other => Err(format!("unknown store name '{other}'")),
        }
    }
}

/// The set of enabled stores, opened from configuration.
///
/// Connections are long lived: acquired here, released when the set drops.
/// Opening fails fast on the first store that cannot be initialized; stores
/// opened before the failure are released on that exit path by drop order.
pub struct StoreSet {
    entries: Vec<(StoreName, Box<dyn StoreAdapter>)>,
    sqlite: Option<Arc<SqliteConnection>>,
    kv: Option<Arc<MemoryKv>>,
    doc: Option<Arc<MemoryDoc>>,
}

impl fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSet")
            .field("stores", &self.names())
            .finish()
    }
}

impl StoreSet {
    /// Open every configured store.
    pub fn open(config: &StoresConfig) -> Result<Self, ConnectionError> {
        let mut set = Self {
            entries: Vec::new(),
            sqlite: None,
            kv: None,
            doc: None,
        };

        if config.mysql.is_some() {
            return Err(ConnectionError::DriverUnavailable {
                store: StoreName::MySql,
            });
        }
        if config.postgres.is_some() {
            return Err(ConnectionError::DriverUnavailable {
                store: StoreName::Postgres,
            });
        }

        if let Some(sqlite) = &config.sqlite3 {
            let connection = if sqlite.path.is_empty() || sqlite.path == ":memory:" {
                SqliteConnection::open_in_memory()
            } else {
                SqliteConnection::open(&sqlite.path)
            }
            .map_err(|e| ConnectionError::Open {
                store: StoreName::Sqlite3,
                message: e.to_string(),
            })?;
            let connection = Arc::new(connection);
            set.sqlite = Some(Arc::clone(&connection));
            set.entries.push((
                StoreName::Sqlite3,
                Box::new(RelationalStore::new(connection, Dialect::Sqlite)),
            ));
            info!(store = %StoreName::Sqlite3, "store opened");
        }

        if let Some(kv) = &config.redis {
            let engine = Arc::new(MemoryKv::new());
            set.kv = Some(Arc::clone(&engine));
            set.entries.push((
                StoreName::Redis,
                Box::new(KvStore::new(engine, kv.schema.clone())),
            ));
            info!(store = %StoreName::Redis, schema = %kv.schema, "store opened");
        }

        if let Some(doc) = &config.mongodb {
            let engine = Arc::new(MemoryDoc::new());
            set.doc = Some(Arc::clone(&engine));
            set.entries
                .push((StoreName::MongoDb, Box::new(DocStore::new(engine))));
            info!(store = %StoreName::MongoDb, db = %doc.db, "store opened");
        }

        if set.entries.is_empty() {
            return Err(ConnectionError::NoStores);
        }
        Ok(set)
    }

    /// Enabled adapters, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (StoreName, &dyn StoreAdapter)> {
        self.entries.iter().map(|(name, a)| (*name, a.as_ref()))
    }

    /// The adapter for `name`, if enabled.
    pub fn get(&self, name: StoreName) -> Option<&dyn StoreAdapter> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, a)| a.as_ref())
    }

    /// Names of the enabled stores.
    pub fn names(&self) -> Vec<StoreName> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    /// Number of enabled stores.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no store is enabled (never the case after a successful open).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The bundled SQLite connection, for schema provisioning.
    pub fn sqlite(&self) -> Option<&Arc<SqliteConnection>> {
        self.sqlite.as_ref()
    }

    /// The bundled key-value engine.
    pub fn kv_engine(&self) -> Option<&Arc<MemoryKv>> {
        self.kv.as_ref()
    }

    /// The bundled document engine.
    pub fn doc_engine(&self) -> Option<&Arc<MemoryDoc>> {
        self.doc.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, SqlServerConfig};

    #[test]
    fn test_open_bundled_stores() {
        let set = StoreSet::open(&EngineConfig::for_testing().stores).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.names(),
            vec![StoreName::Sqlite3, StoreName::Redis, StoreName::MongoDb]
        );
        assert!(set.get(StoreName::Sqlite3).is_some());
        assert!(set.get(StoreName::MySql).is_none());
    }

    #[test]
    fn test_unbundled_driver_fails_fast() {
        let mut config = EngineConfig::for_testing().stores;
        config.mysql = Some(SqlServerConfig {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            database: String::new(),
        });
        let err = StoreSet::open(&config).unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::DriverUnavailable {
                store: StoreName::MySql,
            }
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let err = StoreSet::open(&StoresConfig::default()).unwrap_err();
        assert!(matches!(err, ConnectionError::NoStores));
    }

    #[test]
    fn test_store_set_debug_lists_names() {
        let set = StoreSet::open(&EngineConfig::for_testing().stores).unwrap();
        let rendered = format!("{set:?}");
        assert!(rendered.contains("Sqlite3"));
        assert!(rendered.contains("MongoDb"));
    }

    #[test]
    fn test_store_name_round_trip() {
        for name in [
            StoreName::Sqlite3,
            StoreName::MySql,
            StoreName::Postgres,
            StoreName::Redis,
            StoreName::MongoDb,
        ] {
            assert_eq!(name.as_str().parse::<StoreName>().unwrap(), name);
        }
        assert!("oracle".parse::<StoreName>().is_err());
    }
}
