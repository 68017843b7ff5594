//! sps-dashboard — dashboards over published placement scores.
//!
//! Builds one dashboard per configured dashboard group at provisioning
//! time. Every widget references exactly the series the collector writes,
//! because both sides derive names with [`sps_metrics::MetricIdentity`].
//!
//! # Architecture
//!
//! ```text
//! DashboardBuilder
//!   ├── ScoreProvider::query() → live rows per configuration
//!   ├── MetricIdentity::derive() → series per row
//!   ├── ColorAssigner (one per group) → region/zone color
//!   └── Dashboard { widgets } → body() JSON + provisioning outputs
//! ```

pub mod builder;
pub mod error;
pub mod outputs;
pub mod palette;
pub mod widget;

pub use builder::DashboardBuilder;
pub use error::{DashboardError, DashboardResult};
pub use outputs::{StackOutput, dashboard_arn, provisioning_outputs, sanitise_dashboard_name};
pub use palette::{COLOR_PALETTE, ColorAssigner};
pub use widget::{Dashboard, GraphWidget, MetricSeries, WidgetOptions};
