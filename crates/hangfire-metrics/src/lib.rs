//! hangfire-metrics — Prometheus metrics for Hangfire storages.
//!
//! Holds the fixed descriptor table, runs collection passes against a
//! `Statistics` provider, and renders the result in Prometheus text
//! exposition format.
//!
//! # Architecture
//!
//! ```text
//! HangfireCollector
//!   ├── collect() ← called once per scrape, one pass at a time
//!   │   ├── available() == false → [up=0]
//!   │   └── available() == true  → [up=1, servers, deleted, ...]
//!   └── describe() → all eleven descriptors
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the scrape endpoint
//! ```

pub mod collector;
pub mod descriptors;
pub mod prometheus;

pub use collector::{HangfireCollector, Sample};
pub use descriptors::{
    DEFAULT_NAMESPACE, DescriptorRegistry, MetricDescriptor, MetricKind, build_fq_name,
};
pub use prometheus::{CONTENT_TYPE, render_prometheus};
