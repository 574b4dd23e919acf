//! hangfire-mongo — Hangfire statistics for Hangfire.Mongo storage.
//!
//! Counts are read with `count_documents` against the `jobGraph`
//! collection; succeeded/deleted totals sum every `CounterDto` for the key
//! with an aggregation. Each call is bounded by the runner's timeout and
//! reports `0` on failure.

pub mod filters;
pub mod statistics;

pub use statistics::MongoStatistics;
