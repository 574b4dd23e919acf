//! Exporter configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables and flags (see `cli.rs`). Every key has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! listen_address = "0.0.0.0:8888"
//! metrics_path = "/metrics"
//! query_timeout = "5s"
//! db_type = "mongo"
//!
//! [mongo]
//! connection = "mongodb://localhost:27017"
//! database = "hangfire"
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use clap::ValueEnum;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use hangfire_metrics::DEFAULT_NAMESPACE;
use hangfire_stats::DEFAULT_QUERY_TIMEOUT;

static NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("namespace regex is valid"));

static METRICS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/[A-Za-z0-9._~\-]+)+/?$").expect("path regex is valid"));

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid metrics path {0:?}: must start with '/' and not be the root")]
    MetricsPath(String),

    #[error("invalid metric namespace {0:?}")]
    Namespace(String),

    #[error("invalid query timeout {0:?}")]
    Timeout(String),

    #[error("invalid listen address {0:?}")]
    ListenAddress(String),
}

/// Which Hangfire storage to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Mongo,
    Sqlserver,
    Postgres,
}

impl DbType {
    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Mongo => "mongo",
            DbType::Sqlserver => "sqlserver",
            DbType::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MongoConfig {
    pub connection: String,
    pub database: String,
    /// Hangfire.Mongo collection prefix (`<prefix>.jobGraph`).
    pub collection_prefix: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            connection: "mongodb://localhost:27017".to_string(),
            database: "default".to_string(),
            collection_prefix: "hangfire".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqlServerConfig {
    /// ADO.NET connection string.
    pub connection: String,
    pub schema: String,
}

impl Default for SqlServerConfig {
    fn default() -> Self {
        Self {
            connection: "server=tcp:localhost,1433;database=Hangfire;user id=sa;TrustServerCertificate=true"
                .to_string(),
            schema: "HangFire".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresConfig {
    pub connection: String,
    pub schema: String,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            connection: "postgres://localhost/hangfire".to_string(),
            schema: "hangfire".to_string(),
            max_connections: 4,
        }
    }
}

/// Top-level exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExporterConfig {
    /// `host:port`, or `:port` for all interfaces.
    pub listen_address: String,
    pub metrics_path: String,
    pub namespace: String,
    /// Per-query timeout, e.g. "5s", "500ms", "1m".
    pub query_timeout: String,
    pub log_format: LogFormat,
    pub db_type: DbType,
    pub mongo: MongoConfig,
    pub sqlserver: SqlServerConfig,
    pub postgres: PostgresConfig,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8888".to_string(),
            metrics_path: "/metrics".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            query_timeout: format!("{}s", DEFAULT_QUERY_TIMEOUT.as_secs()),
            log_format: LogFormat::Text,
            db_type: DbType::Sqlserver,
            mongo: MongoConfig::default(),
            sqlserver: SqlServerConfig::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl ExporterConfig {
    /// Load a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every field that would otherwise fail later at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !METRICS_PATH.is_match(&self.metrics_path) {
            return Err(ConfigError::MetricsPath(self.metrics_path.clone()));
        }
        if !NAMESPACE.is_match(&self.namespace) {
            return Err(ConfigError::Namespace(self.namespace.clone()));
        }
        self.query_timeout()?;
        self.listen_address()?;
        Ok(())
    }

    /// Parsed, non-zero per-query timeout.
    pub fn query_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.query_timeout)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| ConfigError::Timeout(self.query_timeout.clone()))
    }

    /// Parsed listen address; `:8888` binds every interface.
    pub fn listen_address(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.listen_address.trim();
        let full = if raw.starts_with(':') {
            format!("0.0.0.0{raw}")
        } else {
            raw.to_string()
        };
        full.parse()
            .map_err(|_| ConfigError::ListenAddress(self.listen_address.clone()))
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
