//! Collector: turns one statistics provider into metric samples.
//!
//! Each scrape runs one collection pass. Passes are serialized with an
//! async mutex so the availability check and the fetches that follow it
//! are never interleaved with another scraper's pass.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::debug;

use hangfire_stats::{Fact, Statistics};

use crate::descriptors::{DescriptorRegistry, MetricDescriptor};

/// One value produced by a collection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub descriptor: &'a MetricDescriptor,
    pub value: f64,
}

/// Collects Hangfire statistics on demand.
pub struct HangfireCollector {
    /// The provider bound at startup.
    statistics: Arc<dyn Statistics>,
    /// Descriptors for `up` and every fact.
    descriptors: DescriptorRegistry,
    /// Held for the whole of a pass.
    pass: Mutex<()>,
}

impl HangfireCollector {
    /// Create a collector over `statistics` publishing under `descriptors`.
    pub fn new(statistics: Arc<dyn Statistics>, descriptors: DescriptorRegistry) -> Self {
        Self {
            statistics,
            descriptors,
            pass: Mutex::new(()),
        }
    }

    /// Every descriptor this collector can emit, without touching the
    /// backend.
    pub fn describe(&self) -> Vec<&MetricDescriptor> {
        self.descriptors.all().collect()
    }

    /// Run one collection pass.
    ///
    /// An unreachable backend yields only `up = 0`. Otherwise `up = 1`
    /// followed by one sample per fact; the facts are fetched concurrently
    /// and each carries its own timeout inside the provider.
    pub async fn collect(&self) -> Vec<Sample<'_>> {
        let _pass = self.pass.lock().await;
        let started = Instant::now();

        if !self.statistics.available().await {
            debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "backend unavailable, reporting up=0"
            );
            return vec![Sample {
                descriptor: self.descriptors.up(),
                value: 0.0,
            }];
        }

        let statistics = self.statistics.as_ref();
        let values = join_all(Fact::ALL.map(|fact| fact.fetch(statistics))).await;

        let mut samples = Vec::with_capacity(self.descriptors.len());
        samples.push(Sample {
            descriptor: self.descriptors.up(),
            value: 1.0,
        });
        for (fact, value) in Fact::ALL.into_iter().zip(values) {
            samples.push(Sample {
                descriptor: self.descriptors.get(fact),
                value,
            });
        }

        debug!(
            samples = samples.len(),
            query_failures = self.statistics.query_failures(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collection pass complete"
        );
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use hangfire_stats::{QueryRunner, StatFuture, StatsError};

    use crate::descriptors::MetricKind;

    /// In-memory provider. Facts listed in `failing` error out; facts
    /// listed in `hanging` never answer. Both go through a real
    /// `QueryRunner`, so they come back as 0 the way adapters report them.
    struct FakeStatistics {
        up: AtomicBool,
        values: HashMap<Fact, f64>,
        failing: Vec<Fact>,
        hanging: Vec<Fact>,
        hang_probe: bool,
        runner: QueryRunner,
        /// Passes currently between probe and last fetch.
        in_pass: AtomicUsize,
        /// Highest `in_pass` ever observed.
        max_in_pass: AtomicUsize,
        probes: AtomicUsize,
    }

    impl FakeStatistics {
        fn new(values: &[(Fact, f64)]) -> Self {
            Self {
                up: AtomicBool::new(true),
                values: values.iter().copied().collect(),
                failing: Vec::new(),
                hanging: Vec::new(),
                hang_probe: false,
                runner: QueryRunner::new("fake", Duration::from_secs(5)),
                in_pass: AtomicUsize::new(0),
                max_in_pass: AtomicUsize::new(0),
                probes: AtomicUsize::new(0),
            }
        }

        fn scenario() -> Self {
            Self::new(&[
                (Fact::Servers, 2.0),
                (Fact::DeletedJobs, 10.0),
                (Fact::EnqueuedJobs, 5.0),
                (Fact::FailedJobs, 1.0),
                (Fact::FetchedJobs, 3.0),
                (Fact::ProcessingJobs, 2.0),
                (Fact::Queues, 0.0),
                (Fact::RecurringJobs, 4.0),
                (Fact::ScheduledJobs, 0.0),
                (Fact::SucceededJobs, 100.0),
            ])
        }

        fn fact(&self, fact: Fact) -> StatFuture<'_, f64> {
            Box::pin(self.runner.count(fact, async move {
                if self.hanging.contains(&fact) {
                    std::future::pending::<()>().await;
                }
                // Yield so concurrent passes would get a chance to overlap.
                tokio::task::yield_now().await;
                let value = if self.failing.contains(&fact) {
                    Err(StatsError::Query(format!("{fact} exploded")))
                } else {
                    Ok(self.values.get(&fact).copied().unwrap_or(0.0))
                };
                if fact == Fact::SucceededJobs {
                    self.in_pass.fetch_sub(1, Ordering::SeqCst);
                }
                value
            }))
        }
    }

    impl Statistics for FakeStatistics {
        fn available(&self) -> StatFuture<'_, bool> {
            Box::pin(self.runner.probe(async move {
                self.probes.fetch_add(1, Ordering::SeqCst);
                if self.hang_probe {
                    std::future::pending::<()>().await;
                }
                if !self.up.load(Ordering::SeqCst) {
                    return Err(StatsError::Connect("refused".to_string()));
                }
                let now = self.in_pass.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_pass.fetch_max(now, Ordering::SeqCst);
                Ok(())
            }))
        }
        fn servers(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::Servers)
        }
        fn deleted_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::DeletedJobs)
        }
        fn enqueued_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::EnqueuedJobs)
        }
        fn failed_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::FailedJobs)
        }
        fn fetched_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::FetchedJobs)
        }
        fn processing_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::ProcessingJobs)
        }
        fn queues(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::Queues)
        }
        fn recurring_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::RecurringJobs)
        }
        fn scheduled_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::ScheduledJobs)
        }
        fn succeeded_jobs(&self) -> StatFuture<'_, f64> {
            self.fact(Fact::SucceededJobs)
        }
    }

    fn collector(stats: FakeStatistics) -> HangfireCollector {
        HangfireCollector::new(Arc::new(stats), DescriptorRegistry::default())
    }

    fn by_name(samples: &[Sample<'_>]) -> HashMap<String, (f64, MetricKind)> {
        samples
            .iter()
            .map(|s| {
                (
                    s.descriptor.name().to_string(),
                    (s.value, s.descriptor.kind()),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn unavailable_backend_reports_only_up_zero() {
        let stats = FakeStatistics::scenario();
        stats.up.store(false, Ordering::SeqCst);
        let collector = collector(stats);

        let samples = collector.collect().await;
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].descriptor.name(), "hangfire_up");
        assert_eq!(samples[0].value, 0.0);
    }

    #[tokio::test]
    async fn available_backend_reports_every_fact() {
        let collector = collector(FakeStatistics::scenario());

        let samples = collector.collect().await;
        assert_eq!(samples.len(), 11);

        let got = by_name(&samples);
        let expected = [
            ("hangfire_up", 1.0, MetricKind::Gauge),
            ("hangfire_servers_total", 2.0, MetricKind::Counter),
            ("hangfire_deleted_jobs_total", 10.0, MetricKind::Counter),
            ("hangfire_enqueued_jobs_total", 5.0, MetricKind::Gauge),
            ("hangfire_failed_jobs_total", 1.0, MetricKind::Counter),
            ("hangfire_fetched_jobs_total", 3.0, MetricKind::Gauge),
            ("hangfire_processing_jobs_total", 2.0, MetricKind::Gauge),
            ("hangfire_queues_total", 0.0, MetricKind::Gauge),
            ("hangfire_recurring_jobs_total", 4.0, MetricKind::Gauge),
            ("hangfire_scheduled_jobs_total", 0.0, MetricKind::Gauge),
            ("hangfire_succeeded_jobs_total", 100.0, MetricKind::Counter),
        ];
        for (name, value, kind) in expected {
            assert_eq!(got.get(name), Some(&(value, kind)), "{name}");
        }
    }

    #[tokio::test]
    async fn up_is_emitted_first() {
        let collector = collector(FakeStatistics::scenario());
        let samples = collector.collect().await;
        assert_eq!(samples[0].descriptor.name(), "hangfire_up");
        assert_eq!(samples[0].value, 1.0);
    }

    #[tokio::test]
    async fn failing_fact_reports_zero_without_aborting_pass() {
        let mut stats = FakeStatistics::scenario();
        stats.failing.push(Fact::Servers);
        let collector = collector(stats);

        let samples = collector.collect().await;
        assert_eq!(samples.len(), 11);

        let got = by_name(&samples);
        assert_eq!(got["hangfire_up"].0, 1.0);
        assert_eq!(got["hangfire_servers_total"].0, 0.0);
        assert_eq!(got["hangfire_deleted_jobs_total"].0, 10.0);
        assert_eq!(got["hangfire_succeeded_jobs_total"].0, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_fact_times_out_without_cancelling_siblings() {
        let mut stats = FakeStatistics::scenario();
        stats.hanging.push(Fact::Servers);
        let collector = collector(stats);

        let samples = collector.collect().await;
        let got = by_name(&samples);
        assert_eq!(samples.len(), 11);
        assert_eq!(got["hangfire_servers_total"].0, 0.0);
        assert_eq!(got["hangfire_enqueued_jobs_total"].0, 5.0);
        assert_eq!(got["hangfire_recurring_jobs_total"].0, 4.0);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_timeout_reports_only_up_zero() {
        let mut stats = FakeStatistics::scenario();
        stats.hang_probe = true;
        let collector = collector(stats);

        let samples = collector.collect().await;
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 0.0);
    }

    #[tokio::test]
    async fn every_pass_probes_again() {
        let stats = Arc::new(FakeStatistics::scenario());
        stats.up.store(false, Ordering::SeqCst);
        let collector = HangfireCollector::new(stats.clone(), DescriptorRegistry::default());

        assert_eq!(collector.collect().await.len(), 1);

        stats.up.store(true, Ordering::SeqCst);
        assert_eq!(collector.collect().await.len(), 11);
        assert_eq!(stats.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_passes_never_interleave() {
        let stats = Arc::new(FakeStatistics::scenario());
        let collector = Arc::new(HangfireCollector::new(
            stats.clone(),
            DescriptorRegistry::default(),
        ));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let collector = collector.clone();
            handles.push(tokio::spawn(async move { collector.collect().await.len() }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 11);
        }

        assert_eq!(stats.probes.load(Ordering::SeqCst), 16);
        assert_eq!(stats.max_in_pass.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn describe_lists_all_descriptors() {
        let collector = collector(FakeStatistics::scenario());
        let described = collector.describe();
        assert_eq!(described.len(), 11);
        assert_eq!(described[0].name(), "hangfire_up");
    }
}
