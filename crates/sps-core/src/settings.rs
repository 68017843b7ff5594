//! sps.toml daemon settings.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub collector: CollectorSettings,
    pub provider: ProviderSettings,
    pub sink: SinkSettings,
    pub dashboard: DashboardSettings,
    pub provisioning: ProvisioningSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// Time between scheduled runs.
    pub interval: String,
    /// Expected wall-clock budget of one run.
    pub budget: String,
    /// `host:port` of the object store gateway.
    pub object_store: String,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            interval: "5m".to_string(),
            budget: "300s".to_string(),
            object_store: "127.0.0.1:9000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// YAML score fixture used by local runs.
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    #[default]
    Log,
    Textfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    pub kind: SinkKind,
    /// Output file for the textfile sink.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Aggregation period of every series.
    pub period: String,
    /// Aggregation statistic of every series.
    pub stat: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            period: "15m".to_string(),
            stat: "Maximum".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningSettings {
    pub partition: String,
    pub region: String,
    pub account_id: String,
    pub function_name: String,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            partition: "aws".to_string(),
            region: "us-east-1".to_string(),
            account_id: "000000000000".to_string(),
            function_name: "spot-placement-score-collector".to_string(),
        }
    }
}

impl ProvisioningSettings {
    /// Identifier of the scheduled collector function.
    pub fn function_arn(&self) -> String {
        format!(
            "arn:{}:lambda:{}:{}:function:{}",
            self.partition, self.region, self.account_id, self.function_name
        )
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| ConfigError::Settings(e.to_string()))?;
        // Surface bad durations at startup rather than on the first run.
        settings.interval()?;
        settings.budget()?;
        settings.period()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Settings(e.to_string()))
    }

    pub fn interval(&self) -> ConfigResult<Duration> {
        duration_setting("collector.interval", &self.collector.interval)
    }

    pub fn budget(&self) -> ConfigResult<Duration> {
        duration_setting("collector.budget", &self.collector.budget)
    }

    pub fn period(&self) -> ConfigResult<Duration> {
        duration_setting("dashboard.period", &self.dashboard.period)
    }
}

fn duration_setting(name: &str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value)
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ConfigError::Settings(format!("{name}: invalid duration {value:?}")))
}

/// Parse a duration string like "5s", "500ms", "5m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.interval().unwrap(), Duration::from_secs(300));
        assert_eq!(settings.budget().unwrap(), Duration::from_secs(300));
        assert_eq!(settings.period().unwrap(), Duration::from_secs(900));
        assert_eq!(settings.sink.kind, SinkKind::Log);
        assert_eq!(settings.dashboard.stat, "Maximum");
    }

    #[test]
    fn parse_sections() {
        let settings = Settings::from_toml_str(
            r#"
[collector]
interval = "1m"

[provider]
fixture = "scores.yaml"

[sink]
kind = "textfile"
path = "/var/lib/node_exporter/sps.prom"

[provisioning]
account_id = "123456789012"
region = "eu-west-1"
"#,
        )
        .unwrap();

        assert_eq!(settings.interval().unwrap(), Duration::from_secs(60));
        assert_eq!(settings.collector.budget, "300s");
        assert_eq!(settings.provider.fixture, Some(PathBuf::from("scores.yaml")));
        assert_eq!(settings.sink.kind, SinkKind::Textfile);
        assert_eq!(
            settings.provisioning.function_arn(),
            "arn:aws:lambda:eu-west-1:123456789012:function:spot-placement-score-collector"
        );
    }

    #[test]
    fn invalid_duration_rejected() {
        let err = Settings::from_toml_str("[collector]\ninterval = \"soon\"").unwrap_err();
        assert!(err.to_string().contains("collector.interval"));
        assert!(Settings::from_toml_str("[collector]\ninterval = \"0s\"").is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml_string().unwrap();
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("abc"), None);
    }

    #[test]
    fn oversized_minutes_are_rejected() {
        assert_eq!(parse_duration("999999999999999999m"), None);
        let err = Settings::from_toml_str("[collector]\ninterval = \"999999999999999999m\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
    }
}
