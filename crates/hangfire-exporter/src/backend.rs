//! Backend selection.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use hangfire_mongo::MongoStatistics;
use hangfire_postgres::PostgresStatistics;
use hangfire_sqlserver::SqlServerStatistics;
use hangfire_stats::{StatsResult, Statistics};

use crate::config::{DbType, ExporterConfig};

/// Connect to the storage named by `config.db_type`.
///
/// Exactly one backend is built; the others' sections are ignored.
pub async fn connect(
    config: &ExporterConfig,
    timeout: Duration,
) -> StatsResult<Arc<dyn Statistics>> {
    info!(db_type = %config.db_type, "connecting to hangfire storage");

    let stats: Arc<dyn Statistics> = match config.db_type {
        DbType::Mongo => Arc::new(
            MongoStatistics::connect(
                &config.mongo.connection,
                &config.mongo.database,
                &config.mongo.collection_prefix,
                timeout,
            )
            .await?,
        ),
        DbType::Sqlserver => Arc::new(
            SqlServerStatistics::connect(
                &config.sqlserver.connection,
                &config.sqlserver.schema,
                timeout,
            )
            .await?,
        ),
        DbType::Postgres => Arc::new(
            PostgresStatistics::connect(
                &config.postgres.connection,
                &config.postgres.schema,
                config.postgres.max_connections,
                timeout,
            )
            .await?,
        ),
    };
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangfire_stats::StatsError;

    #[tokio::test]
    async fn invalid_schema_fails_before_connecting() {
        let config = ExporterConfig {
            db_type: DbType::Postgres,
            postgres: crate::config::PostgresConfig {
                schema: "hangfire; drop table job".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = connect(&config, Duration::from_secs(1)).await.err().unwrap();
        assert!(matches!(err, StatsError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn unreachable_sqlserver_fails_at_startup() {
        let config = ExporterConfig {
            db_type: DbType::Sqlserver,
            sqlserver: crate::config::SqlServerConfig {
                connection: "server=tcp:127.0.0.1,1;user id=sa;password=x;TrustServerCertificate=true"
                    .to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = connect(&config, Duration::from_secs(1)).await.err().unwrap();
        assert!(matches!(
            err,
            StatsError::Connect(_) | StatsError::Timeout(_)
        ));
    }
}
