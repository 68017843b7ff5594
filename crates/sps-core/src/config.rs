//! Diversified configuration model.
//!
//! A configuration document is a list of [`DashboardGroup`]s, each holding
//! raw [`ConfigurationEntry`] declarations. Entries stay untyped until
//! validation so that deduplication can compare full declared content and
//! validation can report every missing field instead of stopping at the
//! first deserialization error.

use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Widget width used when a dashboard group does not declare one.
pub const DEFAULT_WIDGET_WIDTH: u32 = 24;

/// Widget height used when a dashboard group does not declare one.
pub const DEFAULT_WIDGET_HEIGHT: u32 = 6;

const REQUIRED_FIELDS: [&str; 5] = [
    "ConfigurationName",
    "TargetCapacity",
    "TargetCapacityUnitType",
    "SingleAvailabilityZone",
    "RegionNames",
];

const INSTANCE_TYPES: &str = "InstanceTypes";
const INSTANCE_REQUIREMENTS: &str = "InstanceRequirementsWithMetadata";

// ── Dashboard groups ───────────────────────────────────────────────

/// A named collection of configurations rendered together as one dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DashboardGroup {
    pub dashboard: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_widget_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_widget_height: Option<u32>,
    #[serde(default)]
    pub sps: Vec<ConfigurationEntry>,
}

impl DashboardGroup {
    pub fn widget_width(&self) -> u32 {
        self.default_widget_width.unwrap_or(DEFAULT_WIDGET_WIDTH)
    }

    pub fn widget_height(&self) -> u32 {
        self.default_widget_height.unwrap_or(DEFAULT_WIDGET_HEIGHT)
    }

    /// Validate every member configuration in declared order.
    ///
    /// Fails if any member is invalid, reporting all failures at once.
    pub fn configurations(&self) -> ConfigResult<Vec<Configuration>> {
        validate_all(&self.sps)
    }
}

// ── Raw entries ────────────────────────────────────────────────────

/// One declared configuration, exactly as written in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationEntry(Map<String, Value>);

impl ConfigurationEntry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Declared `ConfigurationName`, if it is present and a string.
    pub fn name(&self) -> Option<&str> {
        self.0.get("ConfigurationName").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Canonical rendering of the full entry content.
    ///
    /// Object keys are emitted in sorted order at every depth, so two
    /// entries declaring the same fields in a different order share a key.
    pub fn identity_key(&self) -> String {
        let mut out = String::new();
        write_object(&self.0, &mut out);
        out
    }

    /// Check required fields and convert into a typed [`Configuration`].
    pub fn validate(&self) -> Result<Configuration, ValidationFailure> {
        let mut issues = Vec::new();

        for field in REQUIRED_FIELDS {
            if !self.has(field) {
                issues.push(ValidationIssue::Missing(field.to_string()));
            }
        }
        if !self.has(INSTANCE_TYPES) && !self.has(INSTANCE_REQUIREMENTS) {
            issues.push(ValidationIssue::Missing(format!(
                "{INSTANCE_TYPES} or {INSTANCE_REQUIREMENTS}"
            )));
        }
        if !issues.is_empty() {
            return Err(self.failure(issues));
        }

        let configuration_name: Option<String> = self.field("ConfigurationName", &mut issues);
        let target_capacity: Option<u32> = self.field("TargetCapacity", &mut issues);
        let target_capacity_unit_type: Option<UnitType> =
            self.field("TargetCapacityUnitType", &mut issues);
        let single_availability_zone: Option<bool> =
            self.field("SingleAvailabilityZone", &mut issues);
        let region_names: Option<Vec<String>> = self.field("RegionNames", &mut issues);
        let instance_types: Option<Vec<String>> = if self.has(INSTANCE_TYPES) {
            self.field(INSTANCE_TYPES, &mut issues)
        } else {
            None
        };
        let instance_requirements_with_metadata = match self.0.get(INSTANCE_REQUIREMENTS) {
            Some(value @ Value::Object(_)) => Some(value.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                issues.push(ValidationIssue::Invalid {
                    field: INSTANCE_REQUIREMENTS.to_string(),
                    reason: "expected a mapping".to_string(),
                });
                None
            }
        };

        if configuration_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            issues.push(ValidationIssue::Invalid {
                field: "ConfigurationName".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if target_capacity == Some(0) {
            issues.push(ValidationIssue::Invalid {
                field: "TargetCapacity".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }

        match (
            configuration_name,
            target_capacity,
            target_capacity_unit_type,
            single_availability_zone,
            region_names,
        ) {
            (Some(configuration_name), Some(target_capacity), Some(unit), Some(single_az), Some(regions))
                if issues.is_empty() =>
            {
                Ok(Configuration {
                    configuration_name,
                    target_capacity,
                    target_capacity_unit_type: unit,
                    single_availability_zone: single_az,
                    region_names: regions,
                    instance_types,
                    instance_requirements_with_metadata,
                })
            }
            _ => Err(self.failure(issues)),
        }
    }

    /// A field counts as present only when it holds a non-null value.
    fn has(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|v| !v.is_null())
    }

    fn field<T: DeserializeOwned>(&self, field: &str, issues: &mut Vec<ValidationIssue>) -> Option<T> {
        let value = self.0.get(field)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                issues.push(ValidationIssue::Invalid {
                    field: field.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn failure(&self, issues: Vec<ValidationIssue>) -> ValidationFailure {
        ValidationFailure {
            configuration: self.name().map(str::to_string),
            issues,
        }
    }
}

/// Sorted-key JSON, independent of serde_json's `preserve_order` feature.
fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_value(&map[key], out);
    }
    out.push('}');
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ── Validation results ─────────────────────────────────────────────

/// A single problem found in a configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Missing(String),
    Invalid { field: String, reason: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Missing(field) => write!(f, "missing {field}"),
            ValidationIssue::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

/// All issues found in one configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// `ConfigurationName` of the entry, when it could be read.
    pub configuration: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    /// Names of the required fields this entry is missing.
    pub fn missing_fields(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter_map(|i| match i {
                ValidationIssue::Missing(field) => Some(field.as_str()),
                ValidationIssue::Invalid { .. } => None,
            })
            .collect()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues = self
            .issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.configuration {
            Some(name) => write!(f, "{name}: {issues}"),
            None => write!(f, "<unnamed>: {issues}"),
        }
    }
}

fn validate_all(entries: &[ConfigurationEntry]) -> ConfigResult<Vec<Configuration>> {
    let mut configurations = Vec::with_capacity(entries.len());
    let mut failures = Vec::new();
    for entry in entries {
        match entry.validate() {
            Ok(c) => configurations.push(c),
            Err(f) => failures.push(f),
        }
    }
    if failures.is_empty() {
        Ok(configurations)
    } else {
        Err(ConfigError::Validation(failures))
    }
}

// ── Typed configuration ────────────────────────────────────────────

/// Unit in which `TargetCapacity` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "units")]
    Units,
    #[serde(rename = "vcpu")]
    Vcpu,
    #[serde(rename = "memory-mib")]
    MemoryMib,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Units => "units",
            UnitType::Vcpu => "vcpu",
            UnitType::MemoryMib => "memory-mib",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated workload-shape declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Configuration {
    pub configuration_name: String,
    pub target_capacity: u32,
    pub target_capacity_unit_type: UnitType,
    pub single_availability_zone: bool,
    pub region_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_requirements_with_metadata: Option<Value>,
}

/// How a configuration selects instance types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InstanceSelection<'a> {
    InstanceTypes(&'a [String]),
    Requirements(&'a Value),
}

impl Configuration {
    /// The selection strategy sent to the provider.
    ///
    /// An explicit instance type list wins when both are declared.
    pub fn selection(&self) -> Option<InstanceSelection<'_>> {
        if let Some(types) = &self.instance_types {
            Some(InstanceSelection::InstanceTypes(types))
        } else {
            self.instance_requirements_with_metadata
                .as_ref()
                .map(InstanceSelection::Requirements)
        }
    }
}

// ── Deduplicated set ───────────────────────────────────────────────

/// Every configuration declared across all dashboard groups, with exact
/// duplicates removed. First-seen order is kept.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSet {
    entries: Vec<ConfigurationEntry>,
    declared: usize,
}

impl ConfigurationSet {
    pub fn from_groups(groups: &[DashboardGroup]) -> Self {
        Self::from_entries(groups.iter().flat_map(|g| g.sps.iter().cloned()))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ConfigurationEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        let mut declared = 0;
        for entry in entries {
            declared += 1;
            if seen.insert(entry.identity_key()) {
                unique.push(entry);
            } else {
                debug!(configuration = ?entry.name(), "dropping duplicate configuration");
            }
        }
        Self {
            entries: unique,
            declared,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries before deduplication.
    pub fn declared(&self) -> usize {
        self.declared
    }

    pub fn entries(&self) -> &[ConfigurationEntry] {
        &self.entries
    }

    /// Validate the whole set. A single invalid entry fails the batch.
    pub fn validate(&self) -> ConfigResult<Vec<Configuration>> {
        validate_all(&self.entries)
    }
}
