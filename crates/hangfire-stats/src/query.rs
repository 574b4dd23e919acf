//! Bounded query execution shared by every backend adapter.
//!
//! Adapters hand each backend round trip to a [`QueryRunner`], which applies
//! the configured timeout and folds any failure into the neutral value.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{StatsError, StatsResult};
use crate::statistics::Fact;

/// Per-call timeout used when none is configured.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs backend queries under a timeout and swallows their failures.
#[derive(Debug)]
pub struct QueryRunner {
    /// Backend label for logs ("mongo", "sqlserver", ...).
    backend: &'static str,
    /// Bound applied to every probe and query.
    timeout: Duration,
    /// Queries that failed or timed out since construction.
    failures: AtomicU64,
}

impl QueryRunner {
    /// Create a runner for a backend with the given per-call timeout.
    pub fn new(backend: &'static str, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            failures: AtomicU64::new(0),
        }
    }

    /// Number of fact queries that returned the neutral value because of a
    /// failure.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Run a reachability probe. Any error or timeout means unavailable.
    pub async fn probe<F>(&self, ping: F) -> bool
    where
        F: Future<Output = StatsResult<()>>,
    {
        match self.bounded(ping).await {
            Ok(()) => true,
            Err(e) => {
                warn!(backend = self.backend, error = %e, "availability probe failed");
                false
            }
        }
    }

    /// Run a counting query for `fact`, returning `0.0` on any failure.
    ///
    /// Negative or non-finite results are treated as decode failures so the
    /// non-negative guarantee of the contract holds.
    pub async fn count<F>(&self, fact: Fact, query: F) -> f64
    where
        F: Future<Output = StatsResult<f64>>,
    {
        let result = self.bounded(query).await.and_then(|value| {
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(StatsError::Decode(format!("invalid count {value}")))
            }
        });

        match result {
            Ok(value) => {
                debug!(backend = self.backend, %fact, value, "fact queried");
                value
            }
            Err(e) => {
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    backend = self.backend,
                    %fact,
                    error = %e,
                    failures,
                    "fact query failed, reporting 0"
                );
                0.0
            }
        }
    }

    /// Apply the timeout to a fallible future.
    pub async fn bounded<T, F>(&self, query: F) -> StatsResult<T>
    where
        F: Future<Output = StatsResult<T>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(StatsError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> QueryRunner {
        QueryRunner::new("test", DEFAULT_QUERY_TIMEOUT)
    }

    #[tokio::test]
    async fn count_passes_through_success() {
        let runner = runner();
        let value = runner.count(Fact::Servers, async { Ok(2.0) }).await;
        assert_eq!(value, 2.0);
        assert_eq!(runner.failures(), 0);
    }

    #[tokio::test]
    async fn count_swallows_errors_as_zero() {
        let runner = runner();
        let value = runner
            .count(Fact::FailedJobs, async {
                Err(StatsError::Query("connection reset".to_string()))
            })
            .await;
        assert_eq!(value, 0.0);
        assert_eq!(runner.failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn count_times_out_as_zero() {
        let runner = runner();
        let value = runner
            .count(Fact::EnqueuedJobs, std::future::pending())
            .await;
        assert_eq!(value, 0.0);
        assert_eq!(runner.failures(), 1);
    }

    #[tokio::test]
    async fn count_rejects_negative_values() {
        let runner = runner();
        let value = runner.count(Fact::Queues, async { Ok(-3.0) }).await;
        assert_eq!(value, 0.0);

        let value = runner.count(Fact::Queues, async { Ok(f64::NAN) }).await;
        assert_eq!(value, 0.0);
        assert_eq!(runner.failures(), 2);
    }

    #[tokio::test]
    async fn probe_reports_success() {
        let runner = runner();
        assert!(runner.probe(async { Ok(()) }).await);
    }

    #[tokio::test]
    async fn probe_reports_error_as_unavailable() {
        let runner = runner();
        let ok = runner
            .probe(async { Err(StatsError::Connect("refused".to_string())) })
            .await;
        assert!(!ok);
        // Probes are not fact failures.
        assert_eq!(runner.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_times_out_as_unavailable() {
        let runner = QueryRunner::new("test", Duration::from_millis(100));
        assert!(!runner.probe(std::future::pending()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_reports_timeout_duration() {
        let runner = QueryRunner::new("test", Duration::from_secs(2));
        let err = runner
            .bounded::<(), _>(std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::Timeout(d) if d == Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_query_within_timeout_succeeds() {
        let runner = runner();
        let value = runner
            .count(Fact::Servers, async {
                tokio::time::sleep(Duration::from_secs(4)).await;
                Ok(7.0)
            })
            .await;
        assert_eq!(value, 7.0);
    }
}
