//! Provisioning outputs published alongside the dashboards.

use serde::Serialize;

use crate::widget::Dashboard;

/// Maximum length of a sanitised dashboard name used in output keys.
const MAX_OUTPUT_NAME_LEN: usize = 60;

/// One key/value output of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Lowercase, spaces to underscores, at most 60 characters.
pub fn sanitise_dashboard_name(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "_")
        .chars()
        .take(MAX_OUTPUT_NAME_LEN)
        .collect()
}

pub fn dashboard_arn(partition: &str, account_id: &str, name: &str) -> String {
    format!("arn:{partition}:cloudwatch::{account_id}:dashboard/{name}")
}

/// Collector function ARN first, then one output per dashboard.
pub fn provisioning_outputs(
    function_arn: &str,
    dashboards: &[Dashboard],
    partition: &str,
    account_id: &str,
) -> Vec<StackOutput> {
    let mut outputs = Vec::with_capacity(dashboards.len() + 1);
    outputs.push(StackOutput {
        key: "SPSLambdaARN".to_string(),
        value: function_arn.to_string(),
        description: None,
    });
    for dashboard in dashboards {
        outputs.push(StackOutput {
            key: format!("SPSDashboard-{}", sanitise_dashboard_name(&dashboard.name)),
            value: dashboard_arn(partition, account_id, &dashboard.name),
            description: Some("Spot Placement Score Dashboard".to_string()),
        });
    }
    outputs
}
