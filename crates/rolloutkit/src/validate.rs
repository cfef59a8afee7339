//! Config validation
//!
//! The config loader hands back an untyped JSON value. [`validate_config`] is
//! the only way to turn it into a [`SyncConfig`], so everything downstream
//! works with a config that already passed every check.

use crate::diff::get_config_feature_keys;
use crate::error::{Error, Result};
use crate::types::{MAX_PERCENTAGE, SyncConfig};
use serde_json::{Map, Number, Value};

/// Validate an untyped config value and convert it into a [`SyncConfig`].
///
/// Checks run in order and the first violation is returned:
/// 1. the value is an object whose every property is an object
/// 2. every feature value is an integer from 0 to 10,000
/// 3. every environment declares the same feature keys
pub fn validate_config(value: &Value) -> Result<SyncConfig> {
    let environments = as_mapping_of_mappings(value)?;

    let mut config = SyncConfig::new();
    for (env_name, features) in environments {
        config.insert_environment(env_name);
        for (feature, feature_value) in features {
            let percentage =
                as_percentage(feature_value).ok_or_else(|| Error::InvalidFeatureValue {
                    environment: env_name.clone(),
                    feature: feature.clone(),
                    value: feature_value.to_string(),
                })?;
            config.insert(env_name, feature, percentage);
        }
    }

    let env_features = get_config_feature_keys(&config);
    if let Some(first) = env_features.first()
        && !env_features.iter().all(|keys| keys == first)
    {
        return Err(Error::InconsistentFeatures);
    }

    log::debug!(
        "Config valid: {} environment(s), {} feature(s)",
        config.len(),
        env_features.first().map_or(0, Vec::len)
    );

    Ok(config)
}

fn as_mapping_of_mappings(value: &Value) -> Result<Vec<(&String, &Map<String, Value>)>> {
    let Value::Object(environments) = value else {
        return Err(Error::InvalidShape);
    };

    environments
        .iter()
        .map(|(name, features)| match features {
            Value::Object(features) => Ok((name, features)),
            _ => Err(Error::InvalidShape),
        })
        .collect()
}

/// Accept integral JSON numbers, including ones written as `100.0`.
fn as_percentage(value: &Value) -> Option<u32> {
    let Value::Number(number) = value else {
        return None;
    };
    let integer = integral(number)?;
    if (0..=i128::from(MAX_PERCENTAGE)).contains(&integer) {
        u32::try_from(integer).ok()
    } else {
        None
    }
}

fn integral(number: &Number) -> Option<i128> {
    if let Some(n) = number.as_u64() {
        return Some(i128::from(n));
    }
    if let Some(n) = number.as_i64() {
        return Some(i128::from(n));
    }
    let float = number.as_f64()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() <= 1e15 {
        Some(float as i128)
    } else {
        None
    }
}
