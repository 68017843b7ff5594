//! Metrics sinks — where published batches end up.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SinkError, SinkResult};
use crate::identity::{Dimension, MetricIdentity};
use crate::prometheus::render_prometheus;

/// Unit attached to a published value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardUnit {
    #[default]
    Count,
}

/// One timestamped point of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatum {
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub unit: StandardUnit,
    /// Placement score, 1 to 10.
    pub value: u8,
    pub timestamp: DateTime<Utc>,
}

impl MetricDatum {
    pub fn new(identity: MetricIdentity, value: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            metric_name: identity.name,
            dimensions: identity.dimensions,
            unit: StandardUnit::Count,
            value,
            timestamp,
        }
    }
}

/// Sink reply. A non-200 status is logged by the caller, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
}

impl SinkResponse {
    pub fn ok() -> Self {
        Self { status: 200 }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Boxed future alias for sink writes.
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = SinkResult<SinkResponse>> + Send + 'a>>;

/// Metrics ingestion backend.
pub trait MetricsSink: Send + Sync {
    /// Write one batch of points under `namespace`.
    fn put_batch<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> SinkFuture<'a>;
}

// ── In-memory ──────────────────────────────────────────────────────

/// Sink that keeps every batch in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<(String, Vec<MetricDatum>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches written so far, as `(namespace, data)`.
    pub fn batches(&self) -> Vec<(String, Vec<MetricDatum>)> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }
}

impl MetricsSink for MemorySink {
    fn put_batch<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> SinkFuture<'a> {
        let result = self
            .batches
            .lock()
            .map(|mut b| b.push((namespace.to_string(), data.to_vec())))
            .map(|_| SinkResponse::ok())
            .map_err(|e| SinkError::Request(e.to_string()));
        Box::pin(async move { result })
    }
}

// ── Log ────────────────────────────────────────────────────────────

/// Sink that emits one structured log line per point.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn put_batch<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> SinkFuture<'a> {
        for datum in data {
            info!(
                %namespace,
                metric = %datum.metric_name,
                value = datum.value,
                timestamp = %datum.timestamp.to_rfc3339(),
                "placement score"
            );
        }
        Box::pin(async { Ok(SinkResponse::ok()) })
    }
}

// ── Prometheus textfile ────────────────────────────────────────────

/// Sink that keeps the latest point of every series and rewrites a
/// Prometheus textfile-collector file after each batch.
#[derive(Debug)]
pub struct TextfileSink {
    path: PathBuf,
    latest: Mutex<BTreeMap<String, (String, MetricDatum)>>,
}

impl TextfileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latest: Mutex::new(BTreeMap::new()),
        }
    }

    fn render(&self, namespace: &str, data: &[MetricDatum]) -> SinkResult<String> {
        let mut latest = self
            .latest
            .lock()
            .map_err(|e| SinkError::Request(e.to_string()))?;
        for datum in data {
            latest.insert(
                datum.metric_name.clone(),
                (namespace.to_string(), datum.clone()),
            );
        }
        let series: Vec<(&str, &MetricDatum)> =
            latest.values().map(|(ns, d)| (ns.as_str(), d)).collect();
        Ok(render_prometheus(&series))
    }

    async fn write(&self, namespace: &str, data: &[MetricDatum]) -> SinkResult<SinkResponse> {
        let text = self.render(namespace, data)?;
        let io_err = |source: std::io::Error| SinkError::Io {
            path: self.path.clone(),
            source,
        };

        // Write then rename so scrapers never see a partial file.
        let tmp = self.path.with_extension("prom.tmp");
        tokio::fs::write(&tmp, text.as_bytes()).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        debug!(path = %self.path.display(), points = data.len(), "textfile updated");
        Ok(SinkResponse::ok())
    }
}

impl MetricsSink for TextfileSink {
    fn put_batch<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> SinkFuture<'a> {
        Box::pin(self.write(namespace, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SPS_METRIC_NAMESPACE;

    fn datum(name: &str, value: u8) -> MetricDatum {
        MetricDatum {
            metric_name: name.to_string(),
            dimensions: vec![Dimension {
                name: "Region".to_string(),
                value: "us-east-1".to_string(),
            }],
            unit: StandardUnit::Count,
            value,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn datum_serializes_score_as_integer() {
        let json = serde_json::to_value(datum("app1-us-east-1-units-10", 8)).unwrap();
        assert_eq!(json["MetricName"], "app1-us-east-1-units-10");
        assert_eq!(json["Unit"], "Count");
        assert!(json["Value"].is_u64());
        assert_eq!(json["Value"], 8);
        assert_eq!(json["Dimensions"][0]["Name"], "Region");
    }

    #[tokio::test]
    async fn memory_sink_records_batches() {
        let sink = MemorySink::new();
        let batch = vec![datum("a", 1), datum("b", 2)];

        let response = sink.put_batch(SPS_METRIC_NAMESPACE, &batch).await.unwrap();
        assert!(response.is_success());

        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, SPS_METRIC_NAMESPACE);
        assert_eq!(batches[0].1, batch);
    }

    #[tokio::test]
    async fn memory_sink_clones_share_storage() {
        let sink = MemorySink::new();
        let observer = sink.clone();
        sink.put_batch("ns", &[datum("a", 1)]).await.unwrap();
        assert_eq!(observer.batches().len(), 1);
    }

    #[tokio::test]
    async fn log_sink_accepts_batches() {
        let response = LogSink.put_batch("ns", &[datum("a", 3)]).await.unwrap();
        assert_eq!(response, SinkResponse::ok());
    }

    #[tokio::test]
    async fn textfile_sink_keeps_latest_point_per_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sps.prom");
        let sink = TextfileSink::new(&path);

        sink.put_batch(SPS_METRIC_NAMESPACE, &[datum("a", 1), datum("b", 2)])
            .await
            .unwrap();
        sink.put_batch(SPS_METRIC_NAMESPACE, &[datum("a", 7)])
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("metric=\"a\""));
        assert!(text.contains("metric=\"b\""));
        assert!(text.lines().any(|l| l.contains("metric=\"a\"") && l.ends_with(" 7")));
        assert!(!text.lines().any(|l| l.contains("metric=\"a\"") && l.ends_with(" 1")));
        assert!(!dir.path().join("sps.prom.tmp").exists());
    }

    #[tokio::test]
    async fn textfile_sink_reports_io_errors() {
        let sink = TextfileSink::new("/nonexistent-dir/sps.prom");
        let err = sink.put_batch("ns", &[datum("a", 1)]).await.unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }
}
