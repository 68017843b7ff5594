//! Placement score rows and the score provider seam.
//!
//! The scoring API client itself lives outside this workspace; the
//! pipeline only talks to it through [`ScoreProvider`].

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Configuration;

/// One score returned by the provider for a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScoreRow {
    pub region: String,
    /// Only present for configurations queried per availability zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone_id: Option<String>,
    /// Placement score, 0–10.
    pub score: u8,
}

impl ScoreRow {
    pub fn region(region: &str, score: u8) -> Self {
        Self {
            region: region.to_string(),
            availability_zone_id: None,
            score,
        }
    }

    pub fn zone(region: &str, zone_id: &str, score: u8) -> Self {
        Self {
            region: region.to_string(),
            availability_zone_id: Some(zone_id.to_string()),
            score,
        }
    }
}

/// Provider reply: the HTTP status of the call plus the returned rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResponse {
    pub status: u16,
    pub rows: Vec<ScoreRow>,
}

impl ScoreResponse {
    pub fn ok(rows: Vec<ScoreRow>) -> Self {
        Self { status: 200, rows }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Errors raised by a score provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("score request failed: {0}")]
    Request(String),

    #[error("failed to load score fixture {path}: {reason}")]
    Fixture { path: PathBuf, reason: String },
}

/// Boxed future alias for score queries.
pub type ScoreFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ScoreResponse, ProviderError>> + Send + 'a>>;

/// Source of placement scores, injected so runs can be tested offline.
///
/// A non-200 status is reported through [`ScoreResponse::status`];
/// `Err` is reserved for calls that could not complete at all.
pub trait ScoreProvider: Send + Sync {
    fn query<'a>(&'a self, configuration: &'a Configuration) -> ScoreFuture<'a>;
}

/// Score provider backed by a YAML fixture keyed by configuration name.
///
/// ```yaml
/// app1:
///   - Region: us-east-1
///     Score: 8
///   - Region: us-east-1
///     AvailabilityZoneId: use1-az1
///     Score: 6
/// ```
///
/// Mirrors the provider's response shape: only regions the configuration
/// asked for are returned, and zone ids only for zone-level configurations.
/// Unknown configurations answer with status 404 and no rows.
#[derive(Debug, Clone, Default)]
pub struct FixtureScoreProvider {
    scores: HashMap<String, Vec<ScoreRow>>,
}

impl FixtureScoreProvider {
    pub fn new(scores: HashMap<String, Vec<ScoreRow>>) -> Self {
        Self { scores }
    }

    pub fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let fixture_err = |reason: String| ProviderError::Fixture {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let scores = serde_yaml::from_str(&content).map_err(|e| fixture_err(e.to_string()))?;
        Ok(Self::new(scores))
    }

    fn respond(&self, configuration: &Configuration) -> ScoreResponse {
        let Some(rows) = self.scores.get(&configuration.configuration_name) else {
            debug!(configuration = %configuration.configuration_name, "no fixture scores");
            return ScoreResponse {
                status: 404,
                rows: Vec::new(),
            };
        };

        let rows = rows
            .iter()
            .filter(|r| configuration.region_names.contains(&r.region))
            .filter(|r| r.availability_zone_id.is_some() == configuration.single_availability_zone)
            .cloned()
            .collect();
        ScoreResponse::ok(rows)
    }
}

impl ScoreProvider for FixtureScoreProvider {
    fn query<'a>(&'a self, configuration: &'a Configuration) -> ScoreFuture<'a> {
        let response = self.respond(configuration);
        Box::pin(async move { Ok(response) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnitType;
    use std::io::Write;

    const FIXTURE: &str = r#"
app1:
  - Region: us-east-1
    Score: 8
  - Region: eu-west-1
    Score: 3
  - Region: us-east-1
    AvailabilityZoneId: use1-az1
    Score: 6
"#;

    fn config(single_az: bool, regions: &[&str]) -> Configuration {
        Configuration {
            configuration_name: "app1".to_string(),
            target_capacity: 10,
            target_capacity_unit_type: UnitType::Units,
            single_availability_zone: single_az,
            region_names: regions.iter().map(|r| r.to_string()).collect(),
            instance_types: Some(vec!["m5.large".to_string()]),
            instance_requirements_with_metadata: None,
        }
    }

    fn provider() -> FixtureScoreProvider {
        let scores = serde_yaml::from_str(FIXTURE).unwrap();
        FixtureScoreProvider::new(scores)
    }

    #[tokio::test]
    async fn region_level_rows_only() {
        let response = provider()
            .query(&config(false, &["us-east-1"]))
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.rows, vec![ScoreRow::region("us-east-1", 8)]);
    }

    #[tokio::test]
    async fn zone_level_rows_only() {
        let response = provider()
            .query(&config(true, &["us-east-1", "eu-west-1"]))
            .await
            .unwrap();
        assert_eq!(response.rows, vec![ScoreRow::zone("us-east-1", "use1-az1", 6)]);
    }

    #[tokio::test]
    async fn unknown_configuration_is_404() {
        let mut c = config(false, &["us-east-1"]);
        c.configuration_name = "other".to_string();
        let response = provider().query(&c).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(response.rows.is_empty());
    }

    #[test]
    fn fixture_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        let provider = FixtureScoreProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.scores["app1"].len(), 3);

        let err = FixtureScoreProvider::from_file(Path::new("/nonexistent.yaml")).unwrap_err();
        assert!(matches!(err, ProviderError::Fixture { .. }));
    }
}
