//! T-SQL for the Hangfire.SqlServer schema.
//!
//! Reads use `nolock` like the Hangfire dashboard does: the numbers are
//! monitoring data and must not block workers. Every query returns a single
//! `bigint` column so decoding is uniform.

use hangfire_stats::keys;
use hangfire_stats::{StatsResult, validate_identifier};

/// Pre-rendered statement per fact for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queries {
    pub servers: String,
    pub deleted_jobs: String,
    pub enqueued_jobs: String,
    pub failed_jobs: String,
    pub fetched_jobs: String,
    pub processing_jobs: String,
    pub recurring_jobs: String,
    pub scheduled_jobs: String,
    pub succeeded_jobs: String,
}

/// Reachability probe.
pub const PING: &str = "SELECT CAST(1 AS bigint)";

impl Queries {
    /// Render all statements for `schema`, rejecting unsafe schema names.
    pub fn for_schema(schema: &str) -> StatsResult<Self> {
        let s = validate_identifier(schema)?;
        Ok(Self {
            servers: format!("SELECT CAST(COUNT(Id) AS bigint) FROM [{s}].Server WITH (NOLOCK)"),
            deleted_jobs: counter_sum(s, keys::DELETED_COUNTER),
            enqueued_jobs: format!(
                "SELECT CAST(COUNT(*) AS bigint) FROM [{s}].JobQueue WITH (NOLOCK) WHERE FetchedAt IS NULL"
            ),
            failed_jobs: job_state_count(s, keys::FAILED_STATE),
            fetched_jobs: format!(
                "SELECT CAST(COUNT(*) AS bigint) FROM [{s}].JobQueue WITH (NOLOCK) WHERE FetchedAt IS NOT NULL"
            ),
            processing_jobs: job_state_count(s, keys::PROCESSING_STATE),
            recurring_jobs: format!(
                "SELECT CAST(COUNT(*) AS bigint) FROM [{s}].[Set] WITH (NOLOCK) WHERE [Key] LIKE N'{}%'",
                keys::RECURRING_JOBS_PREFIX
            ),
            scheduled_jobs: job_state_count(s, keys::SCHEDULED_STATE),
            succeeded_jobs: counter_sum(s, keys::SUCCEEDED_COUNTER),
        })
    }
}

fn job_state_count(schema: &str, state: &str) -> String {
    format!(
        "SELECT CAST(COUNT(Id) AS bigint) FROM [{schema}].Job WITH (NOLOCK) WHERE StateName = N'{state}'"
    )
}

/// Raw counters are merged into `AggregatedCounter` periodically, so a
/// total has to add both tables.
fn counter_sum(schema: &str, key: &str) -> String {
    format!(
        "SELECT CAST(ISNULL(SUM(s.[Value]), 0) AS bigint) FROM (\
         SELECT SUM([Value]) AS [Value] FROM [{schema}].Counter WITH (NOLOCK) WHERE [Key] = N'{key}' \
         UNION ALL \
         SELECT [Value] FROM [{schema}].AggregatedCounter WITH (NOLOCK) WHERE [Key] = N'{key}'\
         ) AS s"
    )
}
