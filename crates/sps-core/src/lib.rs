//! sps-core — shared model for the spot placement score pipeline.
//!
//! Holds everything both the scheduled collector and the dashboard
//! synthesizer need to agree on: the diversified configuration model,
//! where configuration documents come from, how they are deduplicated and
//! validated, and the score provider seam.
//!
//! # Architecture
//!
//! ```text
//! ConfigSource (local file | object store)
//!   └── load() → Vec<DashboardGroup>
//!         └── ConfigurationSet::from_groups() → dedup
//!               └── validate() → Vec<Configuration> (all-or-nothing)
//!
//! ScoreProvider
//!   └── query(&Configuration) → ScoreResponse { status, rows }
//! ```

pub mod config;
pub mod error;
pub mod score;
pub mod settings;
pub mod source;

pub use config::{
    Configuration, ConfigurationEntry, ConfigurationSet, DashboardGroup, InstanceSelection,
    UnitType, ValidationFailure, ValidationIssue,
};
pub use error::{ConfigError, ConfigResult};
pub use score::{FixtureScoreProvider, ProviderError, ScoreProvider, ScoreResponse, ScoreRow};
pub use settings::Settings;
pub use source::{ConfigSource, HttpObjectStore, ObjectResponse, ObjectStore};
