//! Conversions between service rollout rules and plain percentages

use crate::types::{
    EVERYONE, Environment, EnvironmentUpdate, FeatureUpdate, RemoteFeature, RolloutRule,
    SyncConfig,
};

/// The rule targeting everyone in an environment, if there is one
pub fn find_everyone_rollout_rule(environment: &Environment) -> Option<&RolloutRule> {
    environment
        .rollout_rules
        .iter()
        .find(|rule| rule.audience_conditions == EVERYONE)
}

/// Build the config the service currently holds.
///
/// An environment without an "everyone" rule reads as 0.
pub fn transform_remote_features_to_sync_config(features: &[RemoteFeature]) -> SyncConfig {
    let mut config = SyncConfig::new();
    for feature in features {
        for (env_name, environment) in &feature.environments {
            let percentage =
                find_everyone_rollout_rule(environment).map_or(0, |rule| rule.percentage_included);
            config.insert(env_name, &feature.key, percentage);
        }
    }
    config
}

/// Wrap a percentage into an enabled "everyone" rule
pub fn transform_value_to_rollout_rule(value: u32) -> RolloutRule {
    RolloutRule {
        audience_conditions: EVERYONE.to_string(),
        enabled: true,
        percentage_included: value,
    }
}

/// Replacement rules for every environment of `feature` that `config` sets.
///
/// Environments the config has no value for are left out of the update.
pub fn build_feature_update(feature: &RemoteFeature, config: &SyncConfig) -> FeatureUpdate {
    let mut update = FeatureUpdate::default();
    for env_name in feature.environments.keys() {
        match config.get(env_name, &feature.key) {
            Some(value) => {
                update.environments.insert(
                    env_name.clone(),
                    EnvironmentUpdate {
                        rollout_rules: vec![transform_value_to_rollout_rule(value)],
                    },
                );
            }
            None => log::debug!(
                "No configured value for {} in {env_name}, leaving it untouched",
                feature.key
            ),
        }
    }
    update
}
