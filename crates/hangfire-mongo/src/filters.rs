//! Query documents for the Hangfire.Mongo storage layout.
//!
//! Hangfire.Mongo keeps jobs, queue entries, counters and sets in a single
//! `<prefix>.jobGraph` collection, told apart by the `_t` discriminator.
//! Servers live in `<prefix>.server`.

use hangfire_stats::keys;
use hangfire_stats::{StatsError, StatsResult};
use mongodb::bson::{Bson, Document, doc};

pub const JOB_GRAPH: &str = "jobGraph";
pub const SERVER: &str = "server";

const COUNTER_DTO: &str = "CounterDto";
const JOB_QUEUE_DTO: &str = "JobQueueDto";
const JOB_DTO: &str = "JobDto";
const SET_DTO: &str = "SetDto";

/// Fully qualified collection name, `<prefix>.<name>`.
pub fn collection_name(prefix: &str, name: &str) -> String {
    format!("{prefix}.{name}")
}

/// Queue entries nobody has fetched yet. Matches null and missing.
pub fn enqueued() -> Document {
    doc! { "_t": JOB_QUEUE_DTO, "FetchedAt": Bson::Null }
}

/// Queue entries a worker has fetched.
pub fn fetched() -> Document {
    doc! { "_t": JOB_QUEUE_DTO, "FetchedAt": { "$ne": Bson::Null } }
}

/// Jobs currently in the given state.
pub fn in_state(state: &str) -> Document {
    doc! { "_t": JOB_DTO, "StateName": state }
}

/// Set entries registering recurring jobs.
pub fn recurring() -> Document {
    doc! {
        "_t": SET_DTO,
        "Key": { "$regex": format!("^{}", keys::RECURRING_JOBS_PREFIX) },
    }
}

/// Aggregation summing every counter document stored under `key`.
pub fn counter_total(key: &str) -> Vec<Document> {
    vec![
        doc! { "$match": { "_t": COUNTER_DTO, "Key": key } },
        doc! { "$group": { "_id": Bson::Null, "total": { "$sum": "$Value" } } },
    ]
}

/// Read a numeric field regardless of the BSON width it was stored with.
pub fn numeric_field(document: &Document, field: &str) -> StatsResult<f64> {
    match document.get(field) {
        Some(Bson::Int32(v)) => Ok(f64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        Some(Bson::Double(v)) => Ok(*v),
        Some(Bson::Null) | None => Ok(0.0),
        Some(other) => Err(StatsError::Decode(format!(
            "field {field} has non-numeric type {:?}",
            other.element_type()
        ))),
    }
}
