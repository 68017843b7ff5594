//! spsd — spot placement score daemon.
//!
//! Wires the configuration source, the score provider, and the metrics sink
//! into the scheduled collector, and drives dashboard synthesis.
//!
//! # Architecture
//!
//! ```text
//! Collector::handle(event, ctx)
//!   ├── ConfigSource::load()          (fatal on failure)
//!   ├── ConfigurationSet dedup + validate (fatal on failure)
//!   └── Publisher::publish_all()      (per-configuration isolation)
//!         → HandlerResponse { statusCode: 200, body: { result } }
//!
//! schedule::run()   interval loop around Collector::handle
//! synth::synthesize() DashboardBuilder → <name>.json + outputs
//! ```

pub mod handler;
pub mod schedule;
pub mod synth;

pub use handler::{Collector, HandlerBody, HandlerResponse, InvocationContext};
