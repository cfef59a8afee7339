//! Sync operations - converge the service onto the desired config
//!
//! Each operation runs once per sync, computes what differs from the
//! features listed at the start of the run, and fans the remote calls out
//! through [`settle_all`]. A failed call is reported with the others and
//! never stops the rest of its batch.

use crate::backend::Backend;
use crate::batch::{Batch, settle_all};
use crate::diff::{compare_configs, find_unconfigured_features, find_undeployed_features};
use crate::error::{Error, Result};
use crate::report::{Operation, Reporter};
use crate::transform::{build_feature_update, transform_remote_features_to_sync_config};
use crate::types::{FeatureUpdate, RemoteFeature, SyncConfig};

/// Create the features the config declares but the service lacks.
///
/// Nothing is reported when there is nothing to create. A dry run reports
/// the keys and stops.
pub fn create_features<R: Reporter + ?Sized>(
    dry_run: bool,
    backend: &dyn Backend,
    config: &SyncConfig,
    features: &[RemoteFeature],
    reporter: &mut R,
) -> Result<Batch<RemoteFeature>> {
    let to_create = find_undeployed_features(config, features);
    if to_create.is_empty() {
        return Ok(Batch::new());
    }

    if dry_run {
        reporter.line(&format!(
            "Features that would have been created: {}",
            to_create.join(", ")
        ));
        return Ok(Batch::new());
    }

    reporter.line(&format!(
        "Creating the following features: {}",
        to_create.join(", ")
    ));
    let results = settle_all(&to_create, Clone::clone, |key| backend.create_feature(key))?;
    reporter.settled(Operation::Create, &results.records());

    Ok(results)
}

/// Delete the live features the config no longer declares.
///
/// A key whose id cannot be resolved fails on its own without a request.
pub fn delete_features<R: Reporter + ?Sized>(
    dry_run: bool,
    backend: &dyn Backend,
    config: &SyncConfig,
    features: &[RemoteFeature],
    reporter: &mut R,
) -> Result<Batch<()>> {
    let to_delete = find_unconfigured_features(config, features);
    if to_delete.is_empty() {
        return Ok(Batch::new());
    }

    if dry_run {
        reporter.line(&format!(
            "Features that would have been deleted: {}",
            to_delete.join(", ")
        ));
        return Ok(Batch::new());
    }

    reporter.line(&format!(
        "Deleting the following features: {}",
        to_delete.join(", ")
    ));
    let results = settle_all(&to_delete, Clone::clone, |key| {
        let id = features
            .iter()
            .find(|f| &f.key == key)
            .and_then(|f| f.id)
            .ok_or_else(|| Error::MissingRemoteId {
                key: key.clone(),
                action: "delete",
            })?;
        backend.delete_feature(id)
    })?;
    reporter.settled(Operation::Delete, &results.records());

    Ok(results)
}

/// Report the percentages that differ between the config and the service.
///
/// Returns whether there is anything to change.
pub fn detect_changes<R: Reporter + ?Sized>(
    config: &SyncConfig,
    features: &[RemoteFeature],
    reporter: &mut R,
) -> bool {
    let deployed = transform_remote_features_to_sync_config(features);
    let changes = compare_configs(config, &deployed);

    if changes.is_empty() {
        reporter.line("No changes needed.");
        return false;
    }

    reporter.line("Changes:");
    for change in &changes {
        let from = change
            .right_value
            .map_or_else(|| "none".to_string(), |v| v.to_string());
        reporter.line(&format!(
            "  • Environment {}'s \"{}\" feature will change from \"{}\" to \"{}\"",
            change.env_name, change.feature_name, from, change.left_value
        ));
    }
    true
}

/// Write the configured percentage of every environment of every listed
/// feature, one update request per feature.
///
/// A dry run does nothing at all, not even report.
pub fn persist_features<R: Reporter + ?Sized>(
    dry_run: bool,
    backend: &dyn Backend,
    config: &SyncConfig,
    features: &[RemoteFeature],
    reporter: &mut R,
) -> Result<Batch<RemoteFeature>> {
    if dry_run {
        return Ok(Batch::new());
    }

    reporter.line("Persisting configuration:");

    let updates: Vec<(&RemoteFeature, FeatureUpdate)> = features
        .iter()
        .filter_map(|feature| {
            let update = build_feature_update(feature, config);
            if update.is_empty() {
                log::debug!("Nothing configured for {}, skipping update", feature.key);
                None
            } else {
                Some((feature, update))
            }
        })
        .collect();

    let results = settle_all(
        &updates,
        |(feature, _)| feature.key.clone(),
        |(feature, update)| {
            let id = feature.id.ok_or_else(|| Error::MissingRemoteId {
                key: feature.key.clone(),
                action: "update",
            })?;
            backend.update_feature(id, update)
        },
    )?;
    reporter.settled(Operation::Persist, &results.records());

    Ok(results)
}
