//! Dashboard and widget model, grid layout, and body rendering.
//!
//! Bodies use the CloudWatch dashboard JSON layout: a `widgets` array of
//! metric widgets positioned on a 24-column grid.

use std::time::Duration;

use serde_json::{Value, json};
use sps_core::Configuration;
use sps_metrics::MetricIdentity;

use crate::error::DashboardResult;

/// Columns available on one dashboard row.
pub const GRID_COLUMNS: u32 = 24;

/// Upper bound of the placement score scale.
pub const SCORE_MAX: u32 = 10;

/// Presentation settings shared by every series.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOptions {
    /// Region the dashboard is rendered in.
    pub region: String,
    pub period: Duration,
    pub stat: String,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            period: Duration::from_secs(15 * 60),
            stat: "Maximum".to_string(),
        }
    }
}

/// One plotted series.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub identity: MetricIdentity,
    pub label: String,
    pub color: &'static str,
}

impl MetricSeries {
    pub fn new(identity: MetricIdentity, color: &'static str) -> Self {
        Self {
            label: identity.name.clone(),
            identity,
            color,
        }
    }
}

/// A time-series graph covering one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphWidget {
    pub title: String,
    pub series: Vec<MetricSeries>,
    pub width: u32,
    pub height: u32,
}

impl GraphWidget {
    pub fn new(configuration: &Configuration, series: Vec<MetricSeries>, width: u32, height: u32) -> Self {
        Self {
            title: format!(
                "SPS for {}-{}-{}",
                configuration.configuration_name,
                configuration.target_capacity_unit_type,
                configuration.target_capacity
            ),
            series,
            width: width.clamp(1, GRID_COLUMNS),
            height: height.max(1),
        }
    }

    fn properties(&self, namespace: &str, options: &WidgetOptions) -> Value {
        let metrics: Vec<Value> = self
            .series
            .iter()
            .map(|s| {
                let mut row = vec![json!(namespace), json!(s.identity.name)];
                for d in &s.identity.dimensions {
                    row.push(json!(d.name));
                    row.push(json!(d.value));
                }
                row.push(json!({
                    "color": s.color,
                    "label": s.label,
                    "stat": options.stat,
                    "period": options.period.as_secs(),
                }));
                Value::Array(row)
            })
            .collect();

        json!({
            "view": "timeSeries",
            "stacked": false,
            "title": self.title,
            "region": options.region,
            "metrics": metrics,
            "yAxis": {
                "left": {
                    "label": "SPS",
                    "min": 0,
                    "max": SCORE_MAX,
                    "showUnits": false,
                }
            },
        })
    }
}

/// One dashboard: a name plus its widgets in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub name: String,
    pub widgets: Vec<GraphWidget>,
}

impl Dashboard {
    /// `(x, y)` of every widget.
    ///
    /// Widgets flow left to right and wrap to a new row when the next one
    /// does not fit in the remaining columns.
    pub fn layout(&self) -> Vec<(u32, u32)> {
        let (mut x, mut y, mut row_height) = (0, 0, 0);
        let mut positions = Vec::with_capacity(self.widgets.len());
        for w in &self.widgets {
            if x > 0 && x + w.width > GRID_COLUMNS {
                x = 0;
                y += row_height;
                row_height = 0;
            }
            positions.push((x, y));
            x += w.width;
            row_height = row_height.max(w.height);
        }
        positions
    }

    /// Dashboard body as a JSON value.
    pub fn body(&self, namespace: &str, options: &WidgetOptions) -> Value {
        let widgets: Vec<Value> = self
            .widgets
            .iter()
            .zip(self.layout())
            .map(|(w, (x, y))| {
                json!({
                    "type": "metric",
                    "x": x,
                    "y": y,
                    "width": w.width,
                    "height": w.height,
                    "properties": w.properties(namespace, options),
                })
            })
            .collect();
        json!({ "widgets": widgets })
    }

    pub fn body_string(&self, namespace: &str, options: &WidgetOptions) -> DashboardResult<String> {
        Ok(serde_json::to_string_pretty(&self.body(namespace, options))?)
    }

    /// Total number of series across all widgets.
    pub fn series_count(&self) -> usize {
        self.widgets.iter().map(|w| w.series.len()).sum()
    }
}
