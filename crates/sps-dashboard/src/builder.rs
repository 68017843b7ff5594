//! Dashboard builder — turns dashboard groups into dashboards.
//!
//! The provider is queried once per member configuration to learn which
//! series currently exist. A zone-level configuration can expand into one
//! series per observed zone, so widgets cannot be built from the
//! declaration alone.

use std::sync::Arc;

use sps_core::{DashboardGroup, ScoreProvider};
use sps_metrics::MetricIdentity;
use tracing::{error, info, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::palette::ColorAssigner;
use crate::widget::{Dashboard, GraphWidget, MetricSeries};

pub struct DashboardBuilder {
    provider: Arc<dyn ScoreProvider>,
}

impl DashboardBuilder {
    pub fn new(provider: Arc<dyn ScoreProvider>) -> Self {
        Self { provider }
    }

    /// Build one dashboard per group, in declared order.
    pub async fn build_all(&self, groups: &[DashboardGroup]) -> DashboardResult<Vec<Dashboard>> {
        let mut dashboards = Vec::with_capacity(groups.len());
        for group in groups {
            dashboards.push(self.build(group).await?);
        }
        Ok(dashboards)
    }

    /// Build the dashboard of a single group with a fresh color table.
    pub async fn build(&self, group: &DashboardGroup) -> DashboardResult<Dashboard> {
        let configurations = group
            .configurations()
            .map_err(|source| DashboardError::Config {
                dashboard: group.dashboard.clone(),
                source,
            })?;

        let mut colors = ColorAssigner::new();
        let mut widgets = Vec::with_capacity(configurations.len());

        for configuration in &configurations {
            let name = configuration.configuration_name.as_str();
            info!(dashboard = %group.dashboard, configuration = %name, "processing");

            let response = self
                .provider
                .query(configuration)
                .await
                .map_err(|source| DashboardError::Provider {
                    configuration: name.to_string(),
                    source,
                })?;
            if !response.is_success() {
                error!(configuration = %name, status = response.status, "could not retrieve the spot placement score");
            }
            if response.rows.is_empty() {
                warn!(configuration = %name, "no scores returned, widget will have no series");
            }

            let series = response
                .rows
                .iter()
                .map(|row| {
                    let color = colors.assign(&row.region, row.availability_zone_id.as_deref());
                    MetricSeries::new(MetricIdentity::derive(configuration, row), color)
                })
                .collect();

            widgets.push(GraphWidget::new(
                configuration,
                series,
                group.widget_width(),
                group.widget_height(),
            ));
        }

        let dashboard = Dashboard {
            name: group.dashboard.clone(),
            widgets,
        };
        info!(
            dashboard = %dashboard.name,
            widgets = dashboard.widgets.len(),
            series = dashboard.series_count(),
            colors = colors.len(),
            "dashboard built"
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::COLOR_PALETTE;
    use serde_json::{Value, json};
    use sps_core::score::ScoreFuture;
    use sps_core::{Configuration, ConfigurationEntry, ProviderError, ScoreResponse, ScoreRow};
    use sps_metrics::identity::Dimension;
    use sps_metrics::{MemorySink, Publisher};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedProvider {
        rows: HashMap<String, Vec<ScoreRow>>,
        failing: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScoreProvider for ScriptedProvider {
        fn query<'a>(&'a self, configuration: &'a Configuration) -> ScoreFuture<'a> {
            let name = configuration.configuration_name.clone();
            self.calls.lock().unwrap().push(name.clone());
            let result = if self.failing.as_deref() == Some(name.as_str()) {
                Err(ProviderError::Request("access denied".to_string()))
            } else {
                Ok(ScoreResponse::ok(self.rows.get(&name).cloned().unwrap_or_default()))
            };
            Box::pin(async move { result })
        }
    }

    fn entry(name: &str, single_az: bool) -> ConfigurationEntry {
        let value = json!({
            "ConfigurationName": name,
            "TargetCapacity": 10,
            "TargetCapacityUnitType": "units",
            "SingleAvailabilityZone": single_az,
            "RegionNames": ["us-east-1", "eu-west-1"],
            "InstanceTypes": ["m5.large"]
        });
        match value {
            Value::Object(map) => ConfigurationEntry::new(map),
            _ => unreachable!(),
        }
    }

    fn group(name: &str, entries: Vec<ConfigurationEntry>) -> DashboardGroup {
        DashboardGroup {
            dashboard: name.to_string(),
            default_widget_width: None,
            default_widget_height: None,
            sps: entries,
        }
    }

    fn provider() -> ScriptedProvider {
        let mut rows = HashMap::new();
        rows.insert(
            "web".to_string(),
            vec![ScoreRow::region("us-east-1", 8), ScoreRow::region("eu-west-1", 3)],
        );
        rows.insert(
            "batch".to_string(),
            vec![ScoreRow::region("eu-west-1", 5), ScoreRow::region("us-east-1", 9)],
        );
        rows.insert(
            "zonal".to_string(),
            vec![
                ScoreRow::zone("us-east-1", "use1-az1", 6),
                ScoreRow::zone("us-east-1", "use1-az2", 7),
            ],
        );
        ScriptedProvider {
            rows,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_widget_per_configuration_in_order() {
        let builder = DashboardBuilder::new(Arc::new(provider()));
        let d = builder
            .build(&group("Compute", vec![entry("web", false), entry("zonal", true)]))
            .await
            .unwrap();

        assert_eq!(d.name, "Compute");
        let titles: Vec<&str> = d.widgets.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["SPS for web-units-10", "SPS for zonal-units-10"]);
        assert_eq!(d.widgets[0].series.len(), 2);
        assert_eq!(d.widgets[1].series.len(), 2);
        assert_eq!(
            d.widgets[1].series[1].identity.name,
            "zonal-us-east-1-units-10-use1-az2"
        );
        assert!(d.widgets.iter().all(|w| w.width == 24 && w.height == 6));
    }

    #[tokio::test]
    async fn same_region_shares_a_color_across_widgets() {
        let builder = DashboardBuilder::new(Arc::new(provider()));
        let d = builder
            .build(&group("Compute", vec![entry("web", false), entry("batch", false)]))
            .await
            .unwrap();

        let web = &d.widgets[0].series;
        let batch = &d.widgets[1].series;
        assert_eq!(web[0].color, COLOR_PALETTE[0]); // us-east-1
        assert_eq!(web[1].color, COLOR_PALETTE[1]); // eu-west-1
        assert_eq!(batch[0].color, COLOR_PALETTE[1]); // eu-west-1
        assert_eq!(batch[1].color, COLOR_PALETTE[0]); // us-east-1
    }

    #[tokio::test]
    async fn colors_reset_per_dashboard() {
        let builder = DashboardBuilder::new(Arc::new(provider()));
        let dashboards = builder
            .build_all(&[
                group("First", vec![entry("web", false)]),
                group("Second", vec![entry("batch", false)]),
            ])
            .await
            .unwrap();

        assert_eq!(dashboards.len(), 2);
        // eu-west-1 is seen first in the second pass.
        assert_eq!(dashboards[1].widgets[0].series[0].color, COLOR_PALETTE[0]);
    }

    #[tokio::test]
    async fn group_widget_size_is_applied() {
        let builder = DashboardBuilder::new(Arc::new(provider()));
        let mut g = group("Compute", vec![entry("web", false), entry("batch", false)]);
        g.default_widget_width = Some(12);
        g.default_widget_height = Some(8);

        let d = builder.build(&g).await.unwrap();
        assert!(d.widgets.iter().all(|w| w.width == 12 && w.height == 8));
        assert_eq!(d.layout(), vec![(0, 0), (12, 0)]);
    }

    #[tokio::test]
    async fn provider_queried_once_per_member() {
        let p = Arc::new(provider());
        let builder = DashboardBuilder::new(p.clone());
        builder
            .build_all(&[
                group("First", vec![entry("web", false), entry("batch", false)]),
                group("Second", vec![entry("web", false)]),
            ])
            .await
            .unwrap();
        assert_eq!(*p.calls.lock().unwrap(), vec!["web", "batch", "web"]);
    }

    #[tokio::test]
    async fn invalid_member_fails_before_any_query() {
        let p = Arc::new(provider());
        let builder = DashboardBuilder::new(p.clone());
        let mut fields = entry("broken", false).fields().clone();
        fields.remove("RegionNames");
        let broken = ConfigurationEntry::new(fields);

        let err = builder
            .build(&group("Compute", vec![entry("web", false), broken]))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Config { .. }));
        assert!(p.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_error_is_fatal() {
        let p = ScriptedProvider {
            failing: Some("web".to_string()),
            ..provider()
        };
        let builder = DashboardBuilder::new(Arc::new(p));
        let err = builder
            .build(&group("Compute", vec![entry("web", false)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Provider { configuration, .. } if configuration == "web"));
    }

    #[tokio::test]
    async fn empty_rows_give_an_empty_widget() {
        let builder = DashboardBuilder::new(Arc::new(ScriptedProvider::default()));
        let d = builder
            .build(&group("Compute", vec![entry("web", false)]))
            .await
            .unwrap();
        assert_eq!(d.widgets.len(), 1);
        assert!(d.widgets[0].series.is_empty());
    }

    #[tokio::test]
    async fn series_match_published_metrics() {
        let p = Arc::new(provider());
        let g = group("Compute", vec![entry("web", false), entry("zonal", true)]);

        let dashboard = DashboardBuilder::new(p.clone()).build(&g).await.unwrap();

        let sink = MemorySink::new();
        let publisher = Publisher::new(p, Arc::new(sink.clone()));
        let report = publisher.publish_all(&g.configurations().unwrap()).await;
        assert_eq!(report.failed(), 0);

        let plotted: Vec<(&str, &[Dimension])> = dashboard
            .widgets
            .iter()
            .flat_map(|w| &w.series)
            .map(|s| (s.identity.name.as_str(), s.identity.dimensions.as_slice()))
            .collect();
        let batches = sink.batches();
        let published: Vec<(&str, &[Dimension])> = batches
            .iter()
            .flat_map(|(_, data)| data)
            .map(|d| (d.metric_name.as_str(), d.dimensions.as_slice()))
            .collect();

        assert_eq!(plotted.len(), 4);
        assert_eq!(plotted, published);
    }
}
