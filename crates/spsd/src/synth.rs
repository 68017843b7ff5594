//! Dashboard synthesis: build bodies and provisioning outputs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use sps_core::DashboardGroup;
use sps_core::settings::ProvisioningSettings;
use sps_dashboard::{
    DashboardBuilder, StackOutput, WidgetOptions, provisioning_outputs, sanitise_dashboard_name,
};
use sps_metrics::SPS_METRIC_NAMESPACE;
use tracing::info;

/// What a synthesis pass produced.
#[derive(Debug)]
pub struct Synthesis {
    /// Written body files, in dashboard order.
    pub files: Vec<PathBuf>,
    pub outputs: Vec<StackOutput>,
}

/// Build every dashboard and write `<out_dir>/<sanitised name>.json`.
pub async fn synthesize(
    builder: &DashboardBuilder,
    groups: &[DashboardGroup],
    options: &WidgetOptions,
    provisioning: &ProvisioningSettings,
    out_dir: &Path,
) -> anyhow::Result<Synthesis> {
    let dashboards = builder.build_all(groups).await?;

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut files = Vec::with_capacity(dashboards.len());
    for dashboard in &dashboards {
        let body = dashboard.body_string(SPS_METRIC_NAMESPACE, options)?;
        let path = out_dir.join(format!("{}.json", sanitise_dashboard_name(&dashboard.name)));
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(dashboard = %dashboard.name, path = %path.display(), "dashboard body written");
        files.push(path);
    }

    let outputs = provisioning_outputs(
        &provisioning.function_arn(),
        &dashboards,
        &provisioning.partition,
        &provisioning.account_id,
    );
    Ok(Synthesis { files, outputs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use sps_core::source::parse_groups;
    use sps_core::{FixtureScoreProvider, ScoreRow};
    use std::collections::HashMap;
    use std::sync::Arc;

    const CONFIG: &str = r#"
- Dashboard: Web Fleet
  DefaultWidgetWidth: 12
  Sps:
    - ConfigurationName: web
      TargetCapacity: 20
      TargetCapacityUnitType: vcpu
      SingleAvailabilityZone: false
      RegionNames: [us-east-1, eu-west-1]
      InstanceTypes: [c5.large, c6i.large]
- Dashboard: Batch
  Sps:
    - ConfigurationName: batch
      TargetCapacity: 4
      TargetCapacityUnitType: units
      SingleAvailabilityZone: true
      RegionNames: [us-east-1]
      InstanceTypes: [m5.xlarge]
"#;

    fn builder() -> DashboardBuilder {
        let mut scores = HashMap::new();
        scores.insert(
            "web".to_string(),
            vec![ScoreRow::region("us-east-1", 9), ScoreRow::region("eu-west-1", 7)],
        );
        scores.insert(
            "batch".to_string(),
            vec![ScoreRow::zone("us-east-1", "use1-az4", 3)],
        );
        DashboardBuilder::new(Arc::new(FixtureScoreProvider::new(scores)))
    }

    #[tokio::test]
    async fn writes_one_body_per_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let groups = parse_groups(CONFIG).unwrap();

        let synthesis = synthesize(
            &builder(),
            &groups,
            &WidgetOptions::default(),
            &ProvisioningSettings::default(),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(
            synthesis.files,
            vec![dir.path().join("web_fleet.json"), dir.path().join("batch.json")]
        );

        let web: Value =
            serde_json::from_str(&std::fs::read_to_string(&synthesis.files[0]).unwrap()).unwrap();
        let widget = &web["widgets"][0];
        assert_eq!(widget["width"], 12);
        assert_eq!(widget["properties"]["title"], "SPS for web-vcpu-20");
        assert_eq!(widget["properties"]["metrics"].as_array().unwrap().len(), 2);

        let keys: Vec<&str> = synthesis.outputs.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["SPSLambdaARN", "SPSDashboard-web_fleet", "SPSDashboard-batch"]);
        assert_eq!(
            synthesis.outputs[2].value,
            "arn:aws:cloudwatch::000000000000:dashboard/Batch"
        );
    }
}
