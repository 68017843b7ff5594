//! Collector entry point: one invocation loads, validates, and publishes.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sps_core::{ConfigResult, ConfigSource, ConfigurationSet, ObjectStore};
use sps_metrics::{MetricDatum, Publisher};
use tracing::{debug, error, info};

/// Per-invocation metadata supplied by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerBody {
    /// One batch per successfully published configuration.
    pub result: Vec<Vec<MetricDatum>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: HandlerBody,
}

/// The scheduled collector.
pub struct Collector {
    source: ConfigSource,
    store: Arc<dyn ObjectStore>,
    publisher: Publisher,
}

impl Collector {
    pub fn new(source: ConfigSource, store: Arc<dyn ObjectStore>, publisher: Publisher) -> Self {
        Self {
            source,
            store,
            publisher,
        }
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Run one collection pass.
    ///
    /// Only configuration loading and validation errors are returned; a
    /// failing configuration is logged and left out of the result.
    pub async fn handle(
        &self,
        event: &Value,
        ctx: &InvocationContext,
    ) -> ConfigResult<HandlerResponse> {
        info!(request_id = %ctx.request_id, source = self.source.scheme(), "collector invoked");
        debug!(%event, "received event");

        let groups = self.source.load(self.store.as_ref()).await?;
        let set = ConfigurationSet::from_groups(&groups);
        info!(
            dashboards = groups.len(),
            declared = set.declared(),
            unique = set.len(),
            "configurations loaded"
        );

        let configurations = set.validate().inspect_err(|e| {
            error!(request_id = %ctx.request_id, error = %e, "configuration validation failed");
        })?;

        let report = self.publisher.publish_all(&configurations).await;
        info!(
            request_id = %ctx.request_id,
            published = report.succeeded(),
            failed = report.failed(),
            "collector finished"
        );

        Ok(HandlerResponse {
            status_code: 200,
            body: HandlerBody {
                result: report.into_published(),
            },
        })
    }
}
