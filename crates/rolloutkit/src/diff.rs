//! Key-set and value comparison between a local config and the service

use crate::types::{ConfigDiff, ProjectEnvironment, RemoteFeature, SyncConfig};
use std::collections::HashSet;

/// Feature keys of every environment, each list sorted ascending
pub fn get_config_feature_keys(config: &SyncConfig) -> Vec<Vec<String>> {
    config
        .environments()
        .map(|(_, features)| {
            let mut keys: Vec<String> = features.keys().cloned().collect();
            keys.sort();
            keys
        })
        .collect()
}

/// Keys of the given remote features, sorted ascending
pub fn get_remote_feature_keys<'a, I>(features: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a RemoteFeature>,
{
    let mut keys: Vec<String> = features.into_iter().map(|f| f.key.clone()).collect();
    keys.sort();
    keys
}

/// Features the config declares but the service lacks entirely.
///
/// Archived remote features count as deployed.
pub fn find_undeployed_features(config: &SyncConfig, features: &[RemoteFeature]) -> Vec<String> {
    let configured = first_environment_keys(config);
    let deployed = get_remote_feature_keys(features);
    difference(configured, &deployed)
}

/// Live remote features that the config does not declare
pub fn find_unconfigured_features(config: &SyncConfig, features: &[RemoteFeature]) -> Vec<String> {
    let configured = first_environment_keys(config);
    let deployed = get_remote_feature_keys(features.iter().filter(|f| !f.archived));
    difference(deployed, &configured)
}

/// Every (environment, feature) value of `left` that `right` does not match.
///
/// Only pairs present in `left` are reported, in `left`'s order.
pub fn compare_configs(left: &SyncConfig, right: &SyncConfig) -> Vec<ConfigDiff> {
    let mut differences = Vec::new();

    for (env_name, features) in left.environments() {
        for (feature_name, &left_value) in features {
            let right_value = right.get(env_name, feature_name);
            if right_value != Some(left_value) {
                differences.push(ConfigDiff {
                    env_name: env_name.clone(),
                    feature_name: feature_name.clone(),
                    left_value,
                    right_value,
                });
            }
        }
    }

    differences
}

/// Configured environments the project has no live environment for.
///
/// Follows the config's environment order.
pub fn find_unknown_environments(
    config: &SyncConfig,
    environments: &[ProjectEnvironment],
) -> Vec<String> {
    let configured: Vec<String> = config.environments().map(|(name, _)| name.clone()).collect();
    let live: Vec<String> = environments
        .iter()
        .filter(|e| !e.archived)
        .map(|e| e.key.clone())
        .collect();
    difference(configured, &live)
}

fn first_environment_keys(config: &SyncConfig) -> Vec<String> {
    get_config_feature_keys(config)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Elements of `left` not in `right`, keeping `left`'s order
fn difference(left: Vec<String>, right: &[String]) -> Vec<String> {
    let exclude: HashSet<&str> = right.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    left.into_iter()
        .filter(|key| !exclude.contains(key.as_str()) && seen.insert(key.clone()))
        .collect()
}
