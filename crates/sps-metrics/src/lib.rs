//! sps-metrics — turns placement scores into published time series.
//!
//! Derives a stable metric identity per score row, batches the rows of one
//! configuration, and hands each batch to a metrics sink. Failures are
//! isolated per configuration and collected into a [`PublishReport`].
//!
//! # Architecture
//!
//! ```text
//! Publisher
//!   ├── ScoreProvider::query() ← one call per configuration
//!   ├── MetricIdentity::derive() → name + dimensions per row
//!   ├── MetricsSink::put_batch() ← one batch per configuration
//!   └── PublishReport → per-configuration outcomes
//!
//! Sinks
//!   ├── MemorySink (in-process, for tests and dry runs)
//!   ├── LogSink (structured log lines)
//!   └── TextfileSink → render_prometheus() → .prom file
//! ```

pub mod error;
pub mod identity;
pub mod prometheus;
pub mod publisher;
pub mod sink;

pub use error::{PublishError, PublishResult, SinkError, SinkResult};
pub use identity::{Dimension, MetricIdentity, SPS_METRIC_NAMESPACE};
pub use prometheus::render_prometheus;
pub use publisher::{ConfigurationOutcome, PublishReport, Publisher, metric_data};
pub use sink::{
    LogSink, MemorySink, MetricDatum, MetricsSink, SinkResponse, StandardUnit, TextfileSink,
};
