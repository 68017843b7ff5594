//! Publisher — queries scores and writes them to the metrics sink.
//!
//! Configurations are processed one at a time. Each produces a
//! [`ConfigurationOutcome`]; a failing configuration never stops the
//! remaining ones.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sps_core::{Configuration, ScoreProvider, ScoreRow};
use tracing::{debug, error, info};

use crate::error::{PublishError, PublishResult};
use crate::identity::{MetricIdentity, SPS_METRIC_NAMESPACE};
use crate::sink::{MetricDatum, MetricsSink};

/// Result of processing one configuration.
#[derive(Debug)]
pub struct ConfigurationOutcome {
    pub configuration: String,
    pub result: PublishResult<Vec<MetricDatum>>,
}

/// Per-configuration outcomes of one run, in processing order.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub outcomes: Vec<ConfigurationOutcome>,
}

impl PublishReport {
    /// Batches that reached the sink.
    pub fn published(&self) -> impl Iterator<Item = &Vec<MetricDatum>> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// `(configuration, error)` for every configuration that failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &PublishError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.configuration.as_str(), e)))
    }

    pub fn succeeded(&self) -> usize {
        self.published().count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn into_published(self) -> Vec<Vec<MetricDatum>> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect()
    }
}

/// Build the batch for one configuration: one Count point per score row.
pub fn metric_data(
    configuration: &Configuration,
    rows: &[ScoreRow],
    timestamp: DateTime<Utc>,
) -> Vec<MetricDatum> {
    rows.iter()
        .map(|row| {
            MetricDatum::new(
                MetricIdentity::derive(configuration, row),
                row.score,
                timestamp,
            )
        })
        .collect()
}

/// Drives score queries and metric writes.
pub struct Publisher {
    provider: Arc<dyn ScoreProvider>,
    sink: Arc<dyn MetricsSink>,
    namespace: String,
}

impl Publisher {
    pub fn new(provider: Arc<dyn ScoreProvider>, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            provider,
            sink,
            namespace: SPS_METRIC_NAMESPACE.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Process every configuration sequentially and collect the outcomes.
    pub async fn publish_all(&self, configurations: &[Configuration]) -> PublishReport {
        let mut report = PublishReport::default();

        for configuration in configurations {
            let name = configuration.configuration_name.clone();
            let result = self.publish(configuration).await;
            if let Err(e) = &result {
                error!(configuration = %name, error = %e, "error while processing configuration");
            }
            report.outcomes.push(ConfigurationOutcome {
                configuration: name,
                result,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "publish run complete"
        );
        report
    }

    /// Query, derive, and write the scores of a single configuration.
    ///
    /// Non-200 statuses from the provider or the sink are logged and the
    /// configuration still counts as published; only errors fail it.
    pub async fn publish(&self, configuration: &Configuration) -> PublishResult<Vec<MetricDatum>> {
        let name = configuration.configuration_name.as_str();

        info!(configuration = %name, "loading scores");
        let response = self.provider.query(configuration).await?;
        if response.is_success() {
            info!(configuration = %name, status = response.status, rows = response.rows.len(), "scores received");
        } else {
            error!(configuration = %name, status = response.status, "could not retrieve the spot placement score");
        }
        if response.rows.is_empty() {
            return Err(PublishError::NoScores(name.to_string()));
        }

        let data = metric_data(configuration, &response.rows, Utc::now());
        debug!(configuration = %name, ?data, "metric data");

        info!(configuration = %name, namespace = %self.namespace, "putting scores into the metrics sink");
        let stored = self.sink.put_batch(&self.namespace, &data).await?;
        if stored.is_success() {
            info!(configuration = %name, points = data.len(), "scores stored");
        } else {
            error!(configuration = %name, status = stored.status, "could not store metrics");
        }

        Ok(data)
    }
}
