//! Command-line flags.
//!
//! Every flag is optional and backed by an environment variable; a value
//! given either way overrides the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, DbType, ExporterConfig, LogFormat};

#[derive(Debug, Default, Parser)]
#[command(
    name = "hangfire-exporter",
    version,
    about = "Prometheus exporter for Hangfire job storages"
)]
pub struct Cli {
    /// TOML config file.
    #[arg(long, env = "HANGFIRE_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, `host:port` or `:port`.
    #[arg(long, alias = "listenaddress", env = "LISTENADDRESS")]
    pub listen_address: Option<String>,

    /// Path the metrics are served under.
    #[arg(long, alias = "metricspath", env = "METRICSPATH")]
    pub metrics_path: Option<String>,

    /// Metric name prefix.
    #[arg(long, env = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Per-query timeout, e.g. `5s` or `500ms`.
    #[arg(long, alias = "querytimeout", env = "QUERYTIMEOUT")]
    pub query_timeout: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, env = "LOGFORMAT")]
    pub log_format: Option<LogFormat>,

    /// Hangfire storage to read.
    #[arg(long, value_enum, alias = "dbtype", env = "DBTYPE")]
    pub db_type: Option<DbType>,

    /// MongoDB connection string.
    #[arg(long, alias = "mongoconnection", env = "MONGOCONNECTION")]
    pub mongo_connection: Option<String>,

    /// MongoDB database holding the Hangfire collections.
    #[arg(long, alias = "mongodatabase", env = "MONGODATABASE")]
    pub mongo_database: Option<String>,

    /// Hangfire.Mongo collection prefix.
    #[arg(long, alias = "mongoprefix", env = "MONGOPREFIX")]
    pub mongo_prefix: Option<String>,

    /// SQL Server ADO.NET connection string.
    #[arg(long, alias = "sqlserverconnection", env = "SQLSERVERCONNECTION")]
    pub sqlserver_connection: Option<String>,

    /// SQL Server schema holding the Hangfire tables.
    #[arg(long, alias = "sqlserverschema", env = "SQLSERVERSCHEMA")]
    pub sqlserver_schema: Option<String>,

    /// PostgreSQL connection URL.
    #[arg(long, alias = "postgresconnection", env = "POSTGRESCONNECTION")]
    pub postgres_connection: Option<String>,

    /// PostgreSQL schema holding the Hangfire tables.
    #[arg(long, alias = "postgresschema", env = "POSTGRESSCHEMA")]
    pub postgres_schema: Option<String>,
}

impl Cli {
    /// Build the effective configuration: defaults, then the config file,
    /// then whatever was passed on the command line or in the environment.
    pub fn load_config(&self) -> Result<ExporterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every value that was set.
    pub fn apply(&self, config: &mut ExporterConfig) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }

        set(&mut config.listen_address, &self.listen_address);
        set(&mut config.metrics_path, &self.metrics_path);
        set(&mut config.namespace, &self.namespace);
        set(&mut config.query_timeout, &self.query_timeout);
        set(&mut config.log_format, &self.log_format);
        set(&mut config.db_type, &self.db_type);
        set(&mut config.mongo.connection, &self.mongo_connection);
        set(&mut config.mongo.database, &self.mongo_database);
        set(&mut config.mongo.collection_prefix, &self.mongo_prefix);
        set(&mut config.sqlserver.connection, &self.sqlserver_connection);
        set(&mut config.sqlserver.schema, &self.sqlserver_schema);
        set(&mut config.postgres.connection, &self.postgres_connection);
        set(&mut config.postgres.schema, &self.postgres_schema);
    }
}
