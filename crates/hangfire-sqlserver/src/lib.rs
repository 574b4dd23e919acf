//! hangfire-sqlserver — Hangfire statistics for Hangfire.SqlServer storage.

pub mod queries;
pub mod statistics;

pub use queries::Queries;
pub use statistics::SqlServerStatistics;
