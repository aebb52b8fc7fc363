//! Configuration for dalkit
//!
//! Centralized configuration with sensible defaults, loadable from YAML.
//!
//! ## File layout
//! ```text
//! {config_dir}/
//!   ├── dev.yaml
//!   ├── test.yaml
//!   └── produce.yaml
//! ```
//!
//! Every field is optional; missing fields keep their defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DalError, Result};
use crate::sql::SqlDialect;

/// Main configuration for a dalkit instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Runtime
    // -------------------------------------------------------------------------
    /// Environment the process runs in
    pub mode: Mode,

    // -------------------------------------------------------------------------
    // Key-value store
    // -------------------------------------------------------------------------
    pub redis: RedisConfig,

    // -------------------------------------------------------------------------
    // Relational store
    // -------------------------------------------------------------------------
    pub database: DatabaseConfig,

    // -------------------------------------------------------------------------
    // Locks
    // -------------------------------------------------------------------------
    pub lock: LockConfig,
}

/// Run mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Dev,
    Test,
    Produce,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dev => "dev",
            Mode::Test => "test",
            Mode::Produce => "produce",
        }
    }

    /// Default log filter for the mode
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Mode::Dev => "info,dalkit=debug",
            Mode::Test => "info",
            Mode::Produce => "warn",
        }
    }
}

impl FromStr for Mode {
    type Err = DalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Mode::Dev),
            "test" => Ok(Mode::Test),
            "produce" | "prod" | "production" => Ok(Mode::Produce),
            _ => Err(DalError::Config(format!("Unknown mode: {}", s))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,

    /// Split password halves, used only when `password` is empty
    pub password1: String,
    pub password2: String,

    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: String::new(),
            password1: String::new(),
            password2: String::new(),
            db: 0,
        }
    }
}

impl RedisConfig {
    /// Password sent to the server: `password`, else `password1#password2`
    /// when either half is set
    pub fn effective_password(&self) -> String {
        if !self.password.is_empty() {
            return self.password.clone();
        }
        if self.password1.is_empty() && self.password2.is_empty() {
            return String::new();
        }
        format!("{}#{}", self.password1, self.password2)
    }

    /// Connection URL in `redis://[:password@]host:port/db` form, with the
    /// password percent-encoded
    pub fn url(&self) -> String {
        let password = self.effective_password();
        if password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(&password),
                self.host,
                self.port,
                self.db
            )
        }
    }
}

/// Relational store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, or `:memory:`
    pub path: PathBuf,

    /// Dialect used when assembling count queries
    pub dialect: SqlDialect,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            dialect: SqlDialect::Sqlite,
        }
    }
}

/// Blocking lock defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long a blocking acquire waits (milliseconds)
    pub wait_timeout_ms: u64,

    /// Pause between acquire attempts (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 60_000,
            poll_interval_ms: 50,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DalError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `{dir}/{mode}.yaml`; the mode argument wins over the file's own
    pub fn for_mode(dir: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        let path = dir.as_ref().join(format!("{}.yaml", mode));
        let mut config = Self::from_file(&path)?;
        config.mode = mode;
        Ok(config)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the run mode
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the redis host
    pub fn redis_host(mut self, host: impl Into<String>) -> Self {
        self.config.redis.host = host.into();
        self
    }

    /// Set the redis port
    pub fn redis_port(mut self, port: u16) -> Self {
        self.config.redis.port = port;
        self
    }

    /// Set the redis password
    pub fn redis_password(mut self, password: impl Into<String>) -> Self {
        self.config.redis.password = password.into();
        self
    }

    /// Set the redis database index
    pub fn redis_db(mut self, db: i64) -> Self {
        self.config.redis.db = db;
        self
    }

    /// Set the database file
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database.path = path.into();
        self
    }

    /// Set the SQL dialect
    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.config.database.dialect = dialect;
        self
    }

    /// Set the blocking-lock wait timeout (in milliseconds)
    pub fn lock_wait_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lock.wait_timeout_ms = ms;
        self
    }

    /// Set the blocking-lock poll interval (in milliseconds)
    pub fn lock_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.lock.poll_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
