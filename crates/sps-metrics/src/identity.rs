//! Metric identity derivation.
//!
//! The identity is the join key between the series the collector writes
//! and the series the dashboards reference, so both sides call
//! [`MetricIdentity::derive`].

use serde::{Deserialize, Serialize};
use sps_core::{Configuration, ScoreRow};

/// Namespace every score is published under.
pub const SPS_METRIC_NAMESPACE: &str = "Spot Placement Score Metrics";

pub const REGION: &str = "Region";
pub const DIVERSIFICATION_NAME: &str = "DiversificationName";
pub const UNIT_TYPE: &str = "UnitType";
pub const TARGET_CAPACITY: &str = "TargetCapacity";
pub const AVAILABILITY_ZONE_ID: &str = "AvailabilityZoneId";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Name plus ordered dimensions addressing one published series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    pub name: String,
    pub dimensions: Vec<Dimension>,
}

impl MetricIdentity {
    /// `{ConfigurationName}-{Region}-{UnitType}-{TargetCapacity}[-{AvailabilityZoneId}]`
    pub fn derive(configuration: &Configuration, row: &ScoreRow) -> Self {
        let unit_type = configuration.target_capacity_unit_type.as_str();
        let capacity = configuration.target_capacity.to_string();

        let mut name = format!(
            "{}-{}-{}-{}",
            configuration.configuration_name, row.region, unit_type, capacity
        );
        let mut dimensions = vec![
            Dimension::new(REGION, row.region.as_str()),
            Dimension::new(DIVERSIFICATION_NAME, configuration.configuration_name.as_str()),
            Dimension::new(UNIT_TYPE, unit_type),
            Dimension::new(TARGET_CAPACITY, capacity),
        ];

        if let Some(zone) = &row.availability_zone_id {
            name.push('-');
            name.push_str(zone);
            dimensions.push(Dimension::new(AVAILABILITY_ZONE_ID, zone.as_str()));
        }

        Self { name, dimensions }
    }

    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}
