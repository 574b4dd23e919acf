//! hangfire-postgres — Hangfire statistics for Hangfire.PostgreSql storage.
//!
//! Uses a small `sqlx` pool; each fact is one `SELECT` returning a
//! `bigint`, bounded by the runner's timeout.

pub mod queries;
pub mod statistics;

pub use queries::Queries;
pub use statistics::PostgresStatistics;
