//! SQL for the Hangfire.PostgreSql schema.
//!
//! Hangfire.PostgreSql creates lower-case tables (`job`, `jobqueue`,
//! `counter`, ...) inside its own schema. Every statement yields one
//! `bigint` so the adapter decodes a single `i64`.

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

impl Queries {
    /// Render all statements for `schema`, rejecting unsafe schema names.
    pub fn for_schema(schema: &str) -> StatsResult<Self> {
        let s = validate_identifier(schema)?;
        Ok(Self {
            servers: format!(r#"SELECT COUNT(*) FROM "{s}"."server""#),
            deleted_jobs: counter_sum(s, keys::DELETED_COUNTER),
            enqueued_jobs: format!(
                r#"SELECT COUNT(*) FROM "{s}"."jobqueue" WHERE "fetchedat" IS NULL"#
            ),
            failed_jobs: job_state_count(s, keys::FAILED_STATE),
            fetched_jobs: format!(
                r#"SELECT COUNT(*) FROM "{s}"."jobqueue" WHERE "fetchedat" IS NOT NULL"#
            ),
            processing_jobs: job_state_count(s, keys::PROCESSING_STATE),
            recurring_jobs: format!(
                r#"SELECT COUNT(*) FROM "{s}"."set" WHERE "key" LIKE '{}%'"#,
                keys::RECURRING_JOBS_PREFIX
            ),
            scheduled_jobs: job_state_count(s, keys::SCHEDULED_STATE),
            succeeded_jobs: counter_sum(s, keys::SUCCEEDED_COUNTER),
        })
    }
}

fn job_state_count(schema: &str, state: &str) -> String {
    format!(r#"SELECT COUNT(*) FROM "{schema}"."job" WHERE "statename" = '{state}'"#)
}

/// `SUM(bigint)` is `numeric` in PostgreSQL, hence the cast back.
fn counter_sum(schema: &str, key: &str) -> String {
    format!(
        r#"SELECT COALESCE(SUM(s."value"), 0)::bigint FROM (SELECT SUM("value") AS "value" FROM "{schema}"."counter" WHERE "key" = '{key}' UNION ALL SELECT SUM("value") FROM "{schema}"."aggregatedcounter" WHERE "key" = '{key}') AS s"#
    )
}
