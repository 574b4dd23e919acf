//! `Statistics` over a Hangfire.SqlServer database.
//!
//! A TDS connection handles one request at a time, so the client sits
//! behind an async mutex and calls take turns. The timeout only starts once
//! a call holds the connection: waiting behind a slow sibling never eats
//! into another fact's budget.
//!
//! The client is taken out of its slot for the duration of a call and only
//! put back when the call completes. A call that errors or is cut off by the
//! timeout drops it, and the next call opens a fresh connection instead of
//! reading a half-consumed stream.

use std::time::Duration;

use hangfire_stats::{Fact, QueryRunner, StatFuture, Statistics, StatsResult, map_err};
use tiberius::{Client, Config};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::queries::{PING, Queries};

type TdsClient = Client<Compat<TcpStream>>;

/// Hangfire statistics read from a SQL Server database.
pub struct SqlServerStatistics {
    config: Config,
    client: Mutex<Option<TdsClient>>,
    queries: Queries,
    runner: QueryRunner,
}

impl SqlServerStatistics {
    /// Connect with an ADO.NET connection string and the Hangfire schema name.
    pub async fn connect(connection: &str, schema: &str, timeout: Duration) -> StatsResult<Self> {
        let queries = Queries::for_schema(schema)?;
        let config = Config::from_ado_string(connection).map_err(map_err!(Connect))?;
        let runner = QueryRunner::new("sqlserver", timeout);

        let client = runner.bounded(open(&config)).await?;
        info!(addr = %config.get_addr(), %schema, "connected to sql server");

        Ok(Self {
            config,
            client: Mutex::new(Some(client)),
            queries,
            runner,
        })
    }

    fn count<'a>(&'a self, fact: Fact, sql: &'a str) -> StatFuture<'a, f64> {
        Box::pin(async move {
            let mut slot = self.client.lock().await;
            self.runner
                .count(fact, scalar(&self.config, &mut slot, sql))
                .await
        })
    }
}

/// Run a single-value statement on the client in `slot`, reconnecting first
/// if the previous call lost the connection.
async fn scalar(config: &Config, slot: &mut Option<TdsClient>, sql: &str) -> StatsResult<f64> {
    let mut client = match slot.take() {
        Some(client) => client,
        None => {
            debug!("reopening sql server connection");
            open(config).await?
        }
    };

    let row = client
        .query(sql, &[])
        .await
        .map_err(map_err!(Query))?
        .into_row()
        .await
        .map_err(map_err!(Query))?;
    let value = match row {
        Some(row) => row
            .try_get::<i64, _>(0)
            .map_err(map_err!(Decode))?
            .unwrap_or(0),
        None => 0,
    };

    *slot = Some(client);
    Ok(value as f64)
}

async fn open(config: &Config) -> StatsResult<TdsClient> {
    let tcp = TcpStream::connect(config.get_addr())
        .await
        .map_err(map_err!(Connect))?;
    tcp.set_nodelay(true).map_err(map_err!(Connect))?;
    Client::connect(config.clone(), tcp.compat_write())
        .await
        .map_err(map_err!(Connect))
}

impl Statistics for SqlServerStatistics {
    fn available(&self) -> StatFuture<'_, bool> {
        Box::pin(async move {
            let mut slot = self.client.lock().await;
            self.runner
                .probe(async { scalar(&self.config, &mut slot, PING).await.map(|_| ()) })
                .await
        })
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
