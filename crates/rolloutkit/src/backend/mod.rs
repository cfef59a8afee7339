//! Feature flag service backends.
//!
//! Sync operations talk to the service through the [`Backend`] trait, which
//! lets tests swap in an in-memory implementation.

pub mod optimizely;

use crate::error::Result;
use crate::types::{FeatureUpdate, ProjectEnvironment, RemoteFeature};

/// Remote operations on a project's feature flags.
///
/// Implementations are shared across worker threads during a batch.
pub trait Backend: Send + Sync {
    /// List the environments defined on the project.
    fn list_environments(&self) -> Result<Vec<ProjectEnvironment>>;

    /// List every feature of the project, archived ones included.
    fn list_features(&self) -> Result<Vec<RemoteFeature>>;

    /// Fetch a single feature by id.
    fn get_feature(&self, id: u64) -> Result<RemoteFeature>;

    /// Create a feature with the given key.
    fn create_feature(&self, key: &str) -> Result<RemoteFeature>;

    /// Delete a feature by id.
    fn delete_feature(&self, id: u64) -> Result<()>;

    /// Apply a partial update to a feature.
    fn update_feature(&self, id: u64, update: &FeatureUpdate) -> Result<RemoteFeature>;
}
