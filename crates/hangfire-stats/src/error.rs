//! Error types shared by the Hangfire statistics backends.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for backend operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// Errors that can occur while talking to a Hangfire storage backend.
///
/// Only construction surfaces these to callers. Fact queries turn them into
/// the neutral value `0` inside [`crate::QueryRunner`].
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Convert any `Display` error into a `StatsError` variant via a closure factory.
#[macro_export]
macro_rules! map_err {
    ($variant:ident) => {
        |e| $crate::StatsError::$variant(e.to_string())
    };
}
