//! Error types for publishing scores.

use std::path::PathBuf;

use sps_core::ProviderError;
use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

/// Errors raised by a metrics sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write metrics to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics sink request failed: {0}")]
    Request(String),
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that fail a single configuration without stopping the run.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("score provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("metrics sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("no placement scores returned for {0}")]
    NoScores(String),
}
