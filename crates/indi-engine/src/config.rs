//! Engine configuration.
//!
//! Loaded from a TOML file mapping store names to connection parameters. An
//! absent store section means the store is not enabled and is never
//! attempted; a present section the engine cannot serve fails startup with a
//! distinct [`ConnectionError`](crate::ConnectionError).
//!
//! ```toml
//! tables = ["nonsense"]
//!
//! [stores.sqlite3]
//! path = "indi.db"
//!
//! [stores.redis]
//! schema = "db0"
//!
//! [stores.mongodb]
//! db = "db0"
//!
//! [cache]
//! enabled = true
//!
//! [audit]
//! dir = "logs"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    /// Table names the cache pre-sizes for. Advisory; unknown tables are
    /// still cached, their shards are just allocated lazily.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Store sections; absence disables the store.
    #[serde(default)]
    pub stores: StoresConfig,

    /// Query cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Audit log settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Per-store connection parameters.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoresConfig {
    /// Bundled SQLite store.
    #[serde(default)]
    pub sqlite3: Option<SqliteConfig>,

    /// Key-value store.
    #[serde(default)]
    pub redis: Option<KvConfig>,

    /// Document store.
    #[serde(default)]
    pub mongodb: Option<DocConfig>,

    /// MySQL; no driver is bundled, configuring it fails startup.
    #[serde(default)]
    pub mysql: Option<SqlServerConfig>,

    /// PostgreSQL; no driver is bundled, configuring it fails startup.
    #[serde(default)]
    pub postgres: Option<SqlServerConfig>,
}

impl StoresConfig {
    /// True if no store section is present.
    pub fn is_empty(&self) -> bool {
        self.sqlite3.is_none()
            && self.redis.is_none()
            && self.mongodb.is_none()
            && self.mysql.is_none()
            && self.postgres.is_none()
    }
}

/// SQLite parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
    /// Database file path; `:memory:` or empty for a private in-memory
    /// database.
    #[serde(default = "default_sqlite_path")]
    pub path: String,
}

fn default_sqlite_path() -> String {
    ":memory:".to_string()
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

/// Key-value store parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    /// Key prefix separating this deployment's keys from others sharing the
    /// engine.
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "db0".to_string()
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
        }
    }
}

/// Document store parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DocConfig {
    /// Database name within the document engine.
    #[serde(default = "default_schema")]
    pub db: String,
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            db: default_schema(),
        }
    }
}

/// Network SQL server parameters (mysql/postgres sections).
#[derive(Debug, Clone, Deserialize)]
pub struct SqlServerConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    #[serde(default)]
    pub user: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Database (schema) name.
    #[serde(default)]
    pub database: String,
}

/// Query cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Disable to execute every read against the stores.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Audit log settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Persist mutating statements to `dir` before dispatch.
    #[serde(default)]
    pub enabled: bool,

    /// Directory for audit record files, created on first use.
    #[serde(default = "default_audit_dir")]
    pub dir: String,
}

fn default_audit_dir() -> String {
    "logs".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_audit_dir(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(raw: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| EngineError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| EngineError::Config {
            message: format!("cannot read {}: {e}", path.as_ref().display()),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> EngineResult<()> {
        if self.stores.is_empty() {
            return Err(EngineError::Config {
                message: "at least one store must be enabled".to_string(),
            });
        }
        if self.audit.enabled && self.audit.dir.trim().is_empty() {
            return Err(EngineError::Config {
                message: "audit.dir must not be empty when audit is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// All three bundled stores, in memory, audit disabled.
    pub fn for_testing() -> Self {
        Self {
            tables: Vec::new(),
            stores: StoresConfig {
                sqlite3: Some(SqliteConfig::default()),
                redis: Some(KvConfig::default()),
                mongodb: Some(DocConfig::default()),
                mysql: None,
                postgres: None,
            },
            cache: CacheConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}
