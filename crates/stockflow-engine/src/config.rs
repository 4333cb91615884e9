//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKFLOW_DATABASE_PATH=/var/lib/stockflow/stockflow.db            │
//! │     STOCKFLOW_MAX_CONNECTIONS=8                                        │
//! │     STOCKFLOW_BUSY_TIMEOUT_MS=5000                                     │
//! │     STOCKFLOW_STOCK_CAS_RETRIES=3                                      │
//! │     STOCKFLOW_NUMBER_RETRIES=5                                         │
//! │                                                                         │
//! │  2. TOML Config File (path in STOCKFLOW_CONFIG)                        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockflow.toml
//! [database]
//! path = "/var/lib/stockflow/stockflow.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//!
//! [engine]
//! stock_cas_retries = 3
//! number_retries = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use stockflow_db::DbConfig;

/// Environment variable naming the optional TOML file.
pub const CONFIG_PATH_ENV: &str = "STOCKFLOW_CONFIG";

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("stockflow.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Attempts per ledger delta before `ConcurrentModification`.
    pub stock_cas_retries: u32,

    /// Attempts per create before `NumberConflict`.
    pub number_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            stock_cas_retries: 3,
            number_retries: 5,
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub engine: EngineSettings,
}

impl EngineConfig {
    /// Loads configuration from `STOCKFLOW_CONFIG`, the environment, and
    /// defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Loads configuration with an explicit file and variable lookup.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file, when given (it must exist)
    /// 3. Variables returned by `lookup`
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                info!(?path, "Loading engine config from file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_overrides(lookup)?;
        config.validate()?;

        debug!(
            database = %config.database.path.display(),
            stock_cas_retries = config.engine.stock_cas_retries,
            number_retries = config.engine.number_retries,
            "Engine config loaded"
        );
        Ok(config)
    }

    /// Parses a TOML file. Missing sections and keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("STOCKFLOW_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }
        if let Some(n) = parse_var(&lookup, "STOCKFLOW_MAX_CONNECTIONS")? {
            self.database.max_connections = n;
        }
        if let Some(ms) = parse_var(&lookup, "STOCKFLOW_BUSY_TIMEOUT_MS")? {
            self.database.busy_timeout_ms = ms;
        }
        if let Some(n) = parse_var(&lookup, "STOCKFLOW_STOCK_CAS_RETRIES")? {
            self.engine.stock_cas_retries = n;
        }
        if let Some(n) = parse_var(&lookup, "STOCKFLOW_NUMBER_RETRIES")? {
            self.engine.number_retries = n;
        }
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database.path".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }
        if self.engine.stock_cas_retries == 0 {
            return Err(ConfigError::InvalidValue("engine.stock_cas_retries".to_string()));
        }
        if self.engine.number_retries == 0 {
            return Err(ConfigError::InvalidValue("engine.number_retries".to_string()));
        }
        Ok(())
    }

    /// Pool settings for [`stockflow_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        let base = if self.database.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
        };
        base.busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(None),
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}
