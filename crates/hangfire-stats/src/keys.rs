//! Record keys and state names Hangfire writes into every storage.
//!
//! Adapters build their filters from these so all backends count the same
//! things.

/// Counter key incremented when a job reaches the `Succeeded` state.
pub const SUCCEEDED_COUNTER: &str = "stats:succeeded";

/// Counter key incremented when a job reaches the `Deleted` state.
pub const DELETED_COUNTER: &str = "stats:deleted";

pub const FAILED_STATE: &str = "Failed";
pub const PROCESSING_STATE: &str = "Processing";
pub const SCHEDULED_STATE: &str = "Scheduled";

/// Key prefix of the set holding recurring job registrations.
pub const RECURRING_JOBS_PREFIX: &str = "recurring-jobs";
