//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ValidationFailure;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a run before any score is fetched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not retrieve s3://{bucket}/{key} (status {status})")]
    Fetch {
        bucket: String,
        key: String,
        status: u16,
    },

    #[error("object store request failed: {0}")]
    ObjectStore(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("configuration document declares no dashboards")]
    Empty,

    #[error("got errors when validating configuration: {}", join_failures(.0))]
    Validation(Vec<ValidationFailure>),

    #[error("unsupported configuration source: {0}")]
    UnsupportedSource(String),

    #[error("invalid settings: {0}")]
    Settings(String),
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
