//! Core types for rollout sync

use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// Audience condition of the rule this crate reads and writes.
pub const EVERYONE: &str = "everyone";

/// Upper bound of a rollout percentage, in basis points (100.00%).
pub const MAX_PERCENTAGE: u32 = 10_000;

/// Feature key to rollout percentage for one environment.
pub type EnvironmentConfig = IndexMap<String, u32>;

/// Desired rollout percentages, keyed by environment then feature key.
///
/// A validated `SyncConfig` has the same feature keys in every environment.
/// Environments and features iterate in the order they were inserted, which
/// for a loaded config is the order of the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncConfig(IndexMap<String, EnvironmentConfig>);

impl SyncConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the percentage of a feature in an environment
    pub fn insert(&mut self, environment: &str, feature: &str, value: u32) {
        self.0
            .entry(environment.to_string())
            .or_default()
            .insert(feature.to_string(), value);
    }

    /// Add an environment with no features
    pub fn insert_environment(&mut self, environment: &str) {
        self.0.entry(environment.to_string()).or_default();
    }

    /// Look up a configured percentage
    pub fn get(&self, environment: &str, feature: &str) -> Option<u32> {
        self.0.get(environment)?.get(feature).copied()
    }

    /// Iterate environments with their features
    pub fn environments(&self) -> impl Iterator<Item = (&String, &EnvironmentConfig)> {
        self.0.iter()
    }

    /// Number of environments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no environments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<E, F> FromIterator<(E, F, u32)> for SyncConfig
where
    E: AsRef<str>,
    F: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (E, F, u32)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (environment, feature, value) in iter {
            config.insert(environment.as_ref(), feature.as_ref(), value);
        }
        config
    }
}

/// An environment defined on the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEnvironment {
    /// Key that feature environments are addressed by
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

impl ProjectEnvironment {
    /// Create an environment with only a key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }
}

/// A feature flag as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFeature {
    /// Unique key within the project
    pub key: String,
    /// Service-assigned id; partial payloads may omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub archived: bool,
    /// Per-environment rollout configuration
    #[serde(default)]
    pub environments: IndexMap<String, Environment>,
}

impl RemoteFeature {
    /// Create a feature with no id and no environments
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Mark as archived
    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// Add an environment
    pub fn with_environment(mut self, name: impl Into<String>, environment: Environment) -> Self {
        self.environments.insert(name.into(), environment);
        self
    }
}

/// A feature's configuration in one environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub rollout_rules: Vec<RolloutRule>,
}

impl Environment {
    /// Create an environment holding the given rules
    pub fn with_rules(rules: Vec<RolloutRule>) -> Self {
        Self {
            rollout_rules: rules,
            ..Default::default()
        }
    }
}

/// A targeting rule attached to an environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutRule {
    pub audience_conditions: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub percentage_included: u32,
}

/// Partial feature body for update requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureUpdate {
    pub environments: IndexMap<String, EnvironmentUpdate>,
}

impl FeatureUpdate {
    /// Check if the update touches no environment
    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

/// Replacement rule set for one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentUpdate {
    pub rollout_rules: Vec<RolloutRule>,
}

/// A value that differs between two configs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigDiff {
    pub env_name: String,
    pub feature_name: String,
    /// Value in the left-hand config
    pub left_value: u32,
    /// Value in the right-hand config, if it has one
    pub right_value: Option<u32>,
}
