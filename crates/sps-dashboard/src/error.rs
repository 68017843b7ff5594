//! Dashboard builder error types.

use sps_core::{ConfigError, ProviderError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid configuration in dashboard {dashboard}: {source}")]
    Config {
        dashboard: String,
        #[source]
        source: ConfigError,
    },

    #[error("failed to discover scores for {configuration}: {source}")]
    Provider {
        configuration: String,
        #[source]
        source: ProviderError,
    },

    #[error("failed to render dashboard body: {0}")]
    Render(#[from] serde_json::Error),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
