//! # rolloutkit
//!
//! Reconcile declarative rollout percentages against a feature flag service.
//!
//! A config maps environment names to feature keys to a rollout percentage in
//! basis points (`0` to `10000`). A sync run:
//!
//! 1. validates the config (nothing is written if it is malformed)
//! 2. lists the features the service has
//! 3. creates the features the config declares but the service lacks
//! 4. deletes the live features the config no longer declares
//! 5. rewrites the "everyone" rollout rule of every feature to the configured
//!    percentage
//!
//! ## Example
//!
//! ```no_run
//! use rolloutkit::backend::Backend;
//! use rolloutkit::backend::optimizely::OptimizelyBackend;
//! use rolloutkit::report::CaptureReporter;
//! use rolloutkit::{create_features, read_config_file, validate_config};
//! use std::path::Path;
//!
//! let raw = read_config_file(Path::new("rollout.json")).unwrap();
//! let config = validate_config(&raw).unwrap();
//!
//! let backend = OptimizelyBackend::new("token", 12345);
//! let features = backend.list_features().unwrap();
//!
//! let mut reporter = CaptureReporter::new();
//! let created = create_features(true, &backend, &config, &features, &mut reporter).unwrap();
//! assert!(created.is_empty());
//! ```
//!
//! ## Concurrency
//!
//! Remote calls within a step are issued together and the step waits for all
//! of them ([`batch::settle_all`]). Failures are collected per feature in a
//! [`Batch`]; there are no retries and no rollback.

#![warn(clippy::all)]

pub mod backend;
pub mod batch;
pub mod diff;
pub mod error;
pub mod report;
pub mod source;
pub mod sync;
pub mod transform;
pub mod types;
pub mod validate;

pub use batch::{Batch, SettleStatus, Settled, SettledRecord};
pub use diff::{
    compare_configs, find_unconfigured_features, find_undeployed_features,
    find_unknown_environments, get_config_feature_keys, get_remote_feature_keys,
};
pub use error::{Error, ErrorCategory, Result};
pub use report::{Operation, Reporter};
pub use source::{read_config_dir, read_config_file};
pub use sync::{create_features, delete_features, detect_changes, persist_features};
pub use transform::{
    find_everyone_rollout_rule, transform_remote_features_to_sync_config,
    transform_value_to_rollout_rule,
};
pub use types::{
    ConfigDiff, Environment, FeatureUpdate, MAX_PERCENTAGE, ProjectEnvironment, RemoteFeature,
    RolloutRule, SyncConfig,
};
pub use validate::validate_config;
