//! Metric descriptor registry.
//!
//! Maps `up` and every [`Fact`] to the metric name, help text and kind the
//! exporter publishes. Names and kinds are part of the exporter's public
//! surface; existing dashboards depend on them.

use std::fmt;

use hangfire_stats::Fact;

/// Namespace prefixed to every metric name unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "hangfire";

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable metadata of one exported metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    name: String,
    help: &'static str,
    kind: MetricKind,
}

impl MetricDescriptor {
    pub fn new(name: String, help: &'static str, kind: MetricKind) -> Self {
        Self { name, help, kind }
    }

    /// Fully qualified metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }
}

/// Join the non-empty parts with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Name suffix, help text and kind for a fact.
///
/// `servers_total` is a counter although it is an instantaneous count;
/// dashboards built on the exporter expect that type.
fn fact_metadata(fact: Fact) -> (&'static str, &'static str, MetricKind) {
    match fact {
        Fact::Servers => (
            "servers_total",
            "Number of registered hangfire servers",
            MetricKind::Counter,
        ),
        Fact::DeletedJobs => (
            "deleted_jobs_total",
            "Total number of deleted jobs",
            MetricKind::Counter,
        ),
        Fact::EnqueuedJobs => (
            "enqueued_jobs_total",
            "Current number of enqueued jobs",
            MetricKind::Gauge,
        ),
        Fact::FailedJobs => (
            "failed_jobs_total",
            "Total number of failed jobs",
            MetricKind::Counter,
        ),
        Fact::FetchedJobs => (
            "fetched_jobs_total",
            "Current number of fetched jobs",
            MetricKind::Gauge,
        ),
        Fact::ProcessingJobs => (
            "processing_jobs_total",
            "Current number of processing jobs",
            MetricKind::Gauge,
        ),
        Fact::Queues => ("queues_total", "Number of queues", MetricKind::Gauge),
        Fact::RecurringJobs => (
            "recurring_jobs_total",
            "Current number of recurring jobs",
            MetricKind::Gauge,
        ),
        Fact::ScheduledJobs => (
            "scheduled_jobs_total",
            "Current number of scheduled jobs",
            MetricKind::Gauge,
        ),
        Fact::SucceededJobs => (
            "succeeded_jobs_total",
            "Total number of succeeded jobs",
            MetricKind::Counter,
        ),
    }
}

/// The fixed table of descriptors, built once at startup.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    up: MetricDescriptor,
    /// One entry per fact, in `Fact::ALL` order.
    facts: Vec<(Fact, MetricDescriptor)>,
}

impl DescriptorRegistry {
    /// Build all descriptors under `namespace`.
    pub fn new(namespace: &str) -> Self {
        let up = MetricDescriptor::new(
            build_fq_name(namespace, "", "up"),
            "Can hangfire database be reached",
            MetricKind::Gauge,
        );
        let facts = Fact::ALL
            .iter()
            .map(|&fact| {
                let (suffix, help, kind) = fact_metadata(fact);
                (
                    fact,
                    MetricDescriptor::new(build_fq_name(namespace, "", suffix), help, kind),
                )
            })
            .collect();
        Self { up, facts }
    }

    /// Descriptor of the availability gauge.
    pub fn up(&self) -> &MetricDescriptor {
        &self.up
    }

    /// Descriptor for one fact.
    pub fn get(&self, fact: Fact) -> &MetricDescriptor {
        &self.facts[fact.index()].1
    }

    /// Fact descriptors in exposition order.
    pub fn facts(&self) -> impl Iterator<Item = (Fact, &MetricDescriptor)> {
        self.facts.iter().map(|(fact, d)| (*fact, d))
    }

    /// Every descriptor, `up` first.
    pub fn all(&self) -> impl Iterator<Item = &MetricDescriptor> {
        std::iter::once(&self.up).chain(self.facts.iter().map(|(_, d)| d))
    }

    /// Total number of descriptors, `up` included.
    pub fn len(&self) -> usize {
        self.facts.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
