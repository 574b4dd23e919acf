//! hangfire-stats — the statistics contract behind the Hangfire exporter.
//!
//! Defines what can be asked of a Hangfire storage and how backends answer.
//!
//! # Architecture
//!
//! ```text
//! Statistics (trait, dyn-safe)
//!   ├── available()        ← reachability probe
//!   └── servers(), deleted_jobs(), ... ← ten independent counts
//!
//! QueryRunner
//!   ├── probe()  → bool, bounded by the timeout
//!   └── count()  → f64, bounded, failures folded into 0
//! ```
//!
//! Backend crates (`hangfire-mongo`, `hangfire-sqlserver`,
//! `hangfire-postgres`) implement `Statistics` on top of a `QueryRunner`.

pub mod error;
pub mod identifier;
pub mod keys;
pub mod query;
pub mod statistics;

pub use error::{StatsError, StatsResult};
pub use identifier::validate_identifier;
pub use query::{DEFAULT_QUERY_TIMEOUT, QueryRunner};
pub use statistics::{Fact, StatFuture, Statistics};
