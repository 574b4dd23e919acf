//! `Statistics` over a Hangfire.PostgreSql database.

use std::time::Duration;

use hangfire_stats::{Fact, QueryRunner, StatFuture, Statistics, StatsResult, map_err};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tracing::info;

use crate::queries::Queries;

/// Hangfire statistics read from a PostgreSQL database.
pub struct PostgresStatistics {
    pool: PgPool,
    queries: Queries,
    runner: QueryRunner,
}

impl PostgresStatistics {
    /// Open a pool against `url` and the Hangfire schema.
    ///
    /// Opening the pool establishes one connection, so an unreachable server
    /// fails here.
    pub async fn connect(
        url: &str,
        schema: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> StatsResult<Self> {
        let queries = Queries::for_schema(schema)?;
        let runner = QueryRunner::new("postgres", timeout);

        let pool = runner
            .bounded(async {
                PgPoolOptions::new()
                    .max_connections(max_connections.max(1))
                    .acquire_timeout(timeout)
                    .connect(url)
                    .await
                    .map_err(map_err!(Connect))
            })
            .await?;
        info!(%schema, max_connections, "connected to postgres");

        Ok(Self::with_pool(pool, queries, runner))
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: PgPool, queries: Queries, runner: QueryRunner) -> Self {
        Self {
            pool,
            queries,
            runner,
        }
    }

    async fn ping(&self) -> StatsResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_err!(Connect))?;
        conn.ping().await.map_err(map_err!(Connect))
    }

    async fn scalar(&self, sql: &str) -> StatsResult<f64> {
        let value: i64 = sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err!(Query))?;
        Ok(value as f64)
    }

    fn count<'a>(&'a self, fact: Fact, sql: &'a str) -> StatFuture<'a, f64> {
        Box::pin(self.runner.count(fact, self.scalar(sql)))
    }
}

impl Statistics for PostgresStatistics {
    fn available(&self) -> StatFuture<'_, bool> {
        Box::pin(self.runner.probe(self.ping()))
    }

    fn servers(&self) -> StatFuture<'_, f64> {
        self.count(Fact::Servers, &self.queries.servers)
    }

    fn deleted_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::DeletedJobs, &self.queries.deleted_jobs)
    }

    fn enqueued_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::EnqueuedJobs, &self.queries.enqueued_jobs)
    }

    fn failed_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::FailedJobs, &self.queries.failed_jobs)
    }

    fn fetched_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::FetchedJobs, &self.queries.fetched_jobs)
    }

    fn processing_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::ProcessingJobs, &self.queries.processing_jobs)
    }

    /// Placeholder: always `0`. Counting distinct queue names is not
    /// implemented for this backend.
    fn queues(&self) -> StatFuture<'_, f64> {
        Box::pin(async { 0.0 })
    }

    fn recurring_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::RecurringJobs, &self.queries.recurring_jobs)
    }

    fn scheduled_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::ScheduledJobs, &self.queries.scheduled_jobs)
    }

    fn succeeded_jobs(&self) -> StatFuture<'_, f64> {
        self.count(Fact::SucceededJobs, &self.queries.succeeded_jobs)
    }

    fn query_failures(&self) -> u64 {
        self.runner.failures()
    }
}
