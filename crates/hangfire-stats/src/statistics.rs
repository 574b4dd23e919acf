//! The backend-agnostic statistics contract.
//!
//! Every storage backend implements [`Statistics`]. The collector only ever
//! sees an `Arc<dyn Statistics>`, so the trait hands out boxed futures
//! instead of using `async fn`.
//!
//! # Failure contract
//!
//! Count operations never fail. A timeout, a dropped connection or a
//! document that does not decode all come back as `0.0`, so one slow query
//! degrades one metric rather than the whole scrape. `available()` is the
//! only signal the rest of the values can be trusted.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every [`Statistics`] operation.
pub type StatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Queryable facts about a Hangfire storage.
pub trait Statistics: Send + Sync {
    /// Whether the storage answers a reachability probe within the timeout.
    fn available(&self) -> StatFuture<'_, bool>;

    /// Number of registered Hangfire servers.
    fn servers(&self) -> StatFuture<'_, f64>;

    /// Total number of deleted jobs.
    fn deleted_jobs(&self) -> StatFuture<'_, f64>;

    /// Current number of enqueued (not yet fetched) jobs.
    fn enqueued_jobs(&self) -> StatFuture<'_, f64>;

    /// Total number of failed jobs.
    fn failed_jobs(&self) -> StatFuture<'_, f64>;

    /// Current number of fetched jobs.
    fn fetched_jobs(&self) -> StatFuture<'_, f64>;

    /// Current number of processing jobs.
    fn processing_jobs(&self) -> StatFuture<'_, f64>;

    /// Current number of queues.
    fn queues(&self) -> StatFuture<'_, f64>;

    /// Current number of recurring jobs.
    fn recurring_jobs(&self) -> StatFuture<'_, f64>;

    /// Current number of scheduled jobs.
    fn scheduled_jobs(&self) -> StatFuture<'_, f64>;

    /// Total number of succeeded jobs.
    fn succeeded_jobs(&self) -> StatFuture<'_, f64>;

    /// Fact queries that were reported as `0` because they failed, since
    /// the provider was built.
    fn query_failures(&self) -> u64 {
        0
    }
}

/// One numeric fact of the [`Statistics`] contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    Servers,
    DeletedJobs,
    EnqueuedJobs,
    FailedJobs,
    FetchedJobs,
    ProcessingJobs,
    Queues,
    RecurringJobs,
    ScheduledJobs,
    SucceededJobs,
}

impl Fact {
    /// Every numeric fact, in exposition order.
    pub const ALL: [Fact; 10] = [
        Fact::Servers,
        Fact::DeletedJobs,
        Fact::EnqueuedJobs,
        Fact::FailedJobs,
        Fact::FetchedJobs,
        Fact::ProcessingJobs,
        Fact::Queues,
        Fact::RecurringJobs,
        Fact::ScheduledJobs,
        Fact::SucceededJobs,
    ];

    /// Position of this fact in [`Fact::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name, used in logs and metric names.
    pub fn as_str(self) -> &'static str {
        match self {
            Fact::Servers => "servers",
            Fact::DeletedJobs => "deleted_jobs",
            Fact::EnqueuedJobs => "enqueued_jobs",
            Fact::FailedJobs => "failed_jobs",
            Fact::FetchedJobs => "fetched_jobs",
            Fact::ProcessingJobs => "processing_jobs",
            Fact::Queues => "queues",
            Fact::RecurringJobs => "recurring_jobs",
            Fact::ScheduledJobs => "scheduled_jobs",
            Fact::SucceededJobs => "succeeded_jobs",
        }
    }

    /// Dispatch to the matching [`Statistics`] operation.
    pub fn fetch<'a>(self, stats: &'a dyn Statistics) -> StatFuture<'a, f64> {
        match self {
            Fact::Servers => stats.servers(),
            Fact::DeletedJobs => stats.deleted_jobs(),
            Fact::EnqueuedJobs => stats.enqueued_jobs(),
            Fact::FailedJobs => stats.failed_jobs(),
            Fact::FetchedJobs => stats.fetched_jobs(),
            Fact::ProcessingJobs => stats.processing_jobs(),
            Fact::Queues => stats.queues(),
            Fact::RecurringJobs => stats.recurring_jobs(),
            Fact::ScheduledJobs => stats.scheduled_jobs(),
            Fact::SucceededJobs => stats.succeeded_jobs(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
