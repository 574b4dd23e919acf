//! `Statistics` over a Hangfire.Mongo database.

use std::time::Duration;

use hangfire_stats::keys;
use hangfire_stats::{
    Fact, QueryRunner, StatFuture, Statistics, StatsResult, map_err, validate_identifier,
};
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use crate::filters;

/// Hangfire statistics read from a MongoDB database.
pub struct MongoStatistics {
    database: Database,
    job_graph: Collection<Document>,
    servers: Collection<Document>,
    runner: QueryRunner,
}

impl MongoStatistics {
    /// Connect to `uri` and verify the server answers a ping.
    ///
    /// The driver connects lazily, so the ping is what makes an unreachable
    /// server fail here instead of on the first scrape.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection_prefix: &str,
        timeout: Duration,
    ) -> StatsResult<Self> {
        let database = validate_identifier(database)?;
        let collection_prefix = validate_identifier(collection_prefix)?;

        let runner = QueryRunner::new("mongo", timeout);
        let client = runner
            .bounded(async { Client::with_uri_str(uri).await.map_err(map_err!(Connect)) })
            .await?;
        let stats = Self::with_database(client.database(database), collection_prefix, runner);

        stats.runner.bounded(stats.ping()).await?;
        info!(
            database = stats.database.name(),
            prefix = collection_prefix,
            "connected to mongo"
        );
        Ok(stats)
    }

    /// Wrap a database handle without probing it.
    fn with_database(database: Database, collection_prefix: &str, runner: QueryRunner) -> Self {
        Self {
            job_graph: database
                .collection(&filters::collection_name(collection_prefix, filters::JOB_GRAPH)),
            servers: database
                .collection(&filters::collection_name(collection_prefix, filters::SERVER)),
            database,
            runner,
        }
    }

    async fn ping(&self) -> StatsResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(map_err!(Connect))?;
        Ok(())
    }

    async fn count_documents(
        collection: &Collection<Document>,
        filter: Document,
    ) -> StatsResult<f64> {
        let count = collection
            .count_documents(filter)
            .await
            .map_err(map_err!(Query))?;
        Ok(count as f64)
    }

    async fn counter_total(&self, key: &str) -> StatsResult<f64> {
        let mut cursor = self
            .job_graph
            .aggregate(filters::counter_total(key))
            .await
            .map_err(map_err!(Query))?;

        if !cursor.advance().await.map_err(map_err!(Query))? {
            debug!(%key, "no counter documents");
            return Ok(0.0);
        }
        let total = cursor.deserialize_current().map_err(map_err!(Decode))?;
        filters::numeric_field(&total, "total")
    }

    fn job_count(&self, fact: Fact, filter: Document) -> StatFuture<'_, f64> {
        Box::pin(
            self.runner
                .count(fact, Self::count_documents(&self.job_graph, filter)),
        )
    }
}

impl Statistics for MongoStatistics {
    fn available(&self) -> StatFuture<'_, bool> {
        Box::pin(self.runner.probe(self.ping()))
    }

    fn servers(&self) -> StatFuture<'_, f64> {
        Box::pin(
            self.runner
                .count(Fact::Servers, Self::count_documents(&self.servers, doc! {})),
        )
    }

    fn deleted_jobs(&self) -> StatFuture<'_, f64> {
        Box::pin(
            self.runner
                .count(Fact::DeletedJobs, self.counter_total(keys::DELETED_COUNTER)),
        )
    }

    fn enqueued_jobs(&self) -> StatFuture<'_, f64> {
        self.job_count(Fact::EnqueuedJobs, filters::enqueued())
    }

    fn failed_jobs(&self) -> StatFuture<'_, f64> {
        self.job_count(Fact::FailedJobs, filters::in_state(keys::FAILED_STATE))
    }

    fn fetched_jobs(&self) -> StatFuture<'_, f64> {
        self.job_count(Fact::FetchedJobs, filters::fetched())
    }

    fn processing_jobs(&self) -> StatFuture<'_, f64> {
        self.job_count(
            Fact::ProcessingJobs,
            filters::in_state(keys::PROCESSING_STATE),
        )
    }

    /// Placeholder: always `0`. Counting distinct queue names is not
    /// implemented for this backend.
    fn queues(&self) -> StatFuture<'_, f64> {
        Box::pin(async { 0.0 })
    }

    fn recurring_jobs(&self) -> StatFuture<'_, f64> {
        self.job_count(Fact::RecurringJobs, filters::recurring())
    }

    fn scheduled_jobs(&self) -> StatFuture<'_, f64> {
        self.job_count(
            Fact::ScheduledJobs,
            filters::in_state(keys::SCHEDULED_STATE),
        )
    }

    fn succeeded_jobs(&self) -> StatFuture<'_, f64> {
        Box::pin(self.runner.count(
            Fact::SucceededJobs,
            self.counter_total(keys::SUCCEEDED_COUNTER),
        ))
    }

    fn query_failures(&self) -> u64 {
        self.runner.failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangfire_stats::StatsError;

    /// Nothing listens on port 1; server selection gives up after 200ms.
    const CLOSED: &str = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200";

    /// The driver connects lazily, so building the client succeeds and
    /// every call fails once it needs a server.
    async fn unreachable() -> MongoStatistics {
        let client = Client::with_uri_str(CLOSED).await.unwrap();
        MongoStatistics::with_database(
            client.database("hangfire"),
            "hangfire",
            QueryRunner::new("mongo", Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails_fast() {
        let err = MongoStatistics::connect(CLOSED, "hangfire", "hangfire", Duration::from_secs(2))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StatsError::Connect(_) | StatsError::Timeout(_)));
    }

    #[tokio::test]
    async fn connect_rejects_unsafe_database_name() {
        let err = MongoStatistics::connect(CLOSED, "hang fire", "hangfire", Duration::from_secs(2))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StatsError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let stats = unreachable().await;
        assert!(!stats.available().await);
    }

    #[tokio::test]
    async fn unreachable_server_counts_zero() {
        let stats = unreachable().await;
        assert_eq!(stats.enqueued_jobs().await, 0.0);
        assert_eq!(stats.succeeded_jobs().await, 0.0);
        assert_eq!(stats.query_failures(), 2);
    }

    #[tokio::test]
    async fn queues_is_placeholder() {
        let stats = unreachable().await;
        assert_eq!(stats.queues().await, 0.0);
        assert_eq!(stats.query_failures(), 0);
    }

    #[tokio::test]
    async fn collections_use_prefix() {
        let client = Client::with_uri_str(CLOSED).await.unwrap();
        let stats = MongoStatistics::with_database(
            client.database("jobs"),
            "custom",
            QueryRunner::new("mongo", Duration::from_secs(5)),
        );
        assert_eq!(stats.job_graph.name(), "custom.jobGraph");
        assert_eq!(stats.servers.name(), "custom.server");
    }
}
