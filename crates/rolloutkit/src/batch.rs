//! Settle-all fan-out of remote calls
//!
//! Every item of a batch runs on its own worker, and the batch waits for all of
//! them. A failing item never stops its siblings: its error is kept next to
//! its key in the returned [`Batch`].

use crate::error::{Error, Result};
use crate::types::RemoteFeature;
use rayon::prelude::*;
use serde::Serialize;

/// Outcome of one item in a batch
#[derive(Debug)]
pub struct Settled<T> {
    /// Feature key the call was made for
    pub key: String,
    pub outcome: Result<T>,
}

impl<T> Settled<T> {
    /// Check if the call succeeded
    pub fn is_fulfilled(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Ordered outcomes of a settled batch
#[derive(Debug)]
pub struct Batch<T> {
    entries: Vec<Settled<T>>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Batch<T> {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// All outcomes, in the order the items were given
    pub fn entries(&self) -> &[Settled<T>] {
        &self.entries
    }

    /// Successful values with their keys
    pub fn fulfilled(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .filter_map(|s| s.outcome.as_ref().ok().map(|v| (s.key.as_str(), v)))
    }

    /// Failures with their keys
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.entries
            .iter()
            .filter_map(|s| s.outcome.as_ref().err().map(|e| (s.key.as_str(), e)))
    }

    /// Number of failed items
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|s| !s.is_fulfilled()).count()
    }

    /// Total number of items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch ran nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if every item succeeded
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

impl<T: Describe> Batch<T> {
    /// Type-erased view of the outcomes for reporting
    pub fn records(&self) -> Vec<SettledRecord> {
        self.entries
            .iter()
            .map(|s| match &s.outcome {
                Ok(value) => SettledRecord {
                    key: s.key.clone(),
                    status: SettleStatus::Fulfilled,
                    detail: value.describe(),
                },
                Err(e) => SettledRecord {
                    key: s.key.clone(),
                    status: SettleStatus::Rejected,
                    detail: e.to_string(),
                },
            })
            .collect()
    }
}

/// Whether a settled item succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettleStatus {
    Fulfilled,
    Rejected,
}

/// A settled item, ready to be reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettledRecord {
    pub key: String,
    pub status: SettleStatus,
    /// Value summary when fulfilled, error message when rejected
    pub detail: String,
}

/// Short human-readable summary of a fulfilled value
pub trait Describe {
    fn describe(&self) -> String;
}

impl Describe for () {
    fn describe(&self) -> String {
        "ok".to_string()
    }
}

impl Describe for RemoteFeature {
    fn describe(&self) -> String {
        match self.id {
            Some(id) => format!("{} (id {id})", self.key),
            None => self.key.clone(),
        }
    }
}

/// Run `apply` for every item concurrently and wait for all of them.
///
/// Each item gets its own worker thread, so no call waits for another to
/// start. Outcomes keep the order of `items`.
pub fn settle_all<I, T, K, F>(items: &[I], key_of: K, apply: F) -> Result<Batch<T>>
where
    I: Sync,
    T: Send,
    K: Fn(&I) -> String,
    F: Fn(&I) -> Result<T> + Sync,
{
    if items.is_empty() {
        return Ok(Batch::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(items.len())
        .build()
        .map_err(|e| Error::Other(format!("Failed to create thread pool: {e}")))?;

    let outcomes: Vec<Result<T>> = pool.install(|| items.par_iter().map(&apply).collect());

    let entries = items
        .iter()
        .zip(outcomes)
        .map(|(item, outcome)| Settled {
            key: key_of(item),
            outcome,
        })
        .collect();

    Ok(Batch { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn test_settle_empty() {
        let batch: Batch<()> = settle_all(&[] as &[String], Clone::clone, |_| Ok(())).unwrap();
        assert!(batch.is_empty());
        assert!(batch.is_success());
    }

    #[test]
    fn test_settle_keeps_order_and_failures() {
        let keys: Vec<String> = ["a", "b", "c"].iter().map(ToString::to_string).collect();
        let batch = settle_all(&keys, Clone::clone, |key| {
            if key == "b" {
                Err(Error::remote(500, "nope"))
            } else {
                Ok(key.to_uppercase())
            }
        })
        .unwrap();

        let keys: Vec<&str> = batch.entries().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(batch.failed(), 1);
        assert_eq!(
            batch.fulfilled().map(|(_, v)| v.as_str()).collect::<Vec<_>>(),
            vec!["A", "C"]
        );
        assert_eq!(batch.rejected().next().unwrap().0, "b");
    }

    #[test]
    fn test_settle_runs_items_concurrently() {
        // Every item waits for all the others: this only finishes if they
        // are in flight at the same time.
        let keys: Vec<String> = (0..6).map(|i| format!("feature_{i}")).collect();
        let barrier = Barrier::new(keys.len());
        let batch = settle_all(&keys, Clone::clone, |_| {
            barrier.wait();
            Ok(())
        })
        .unwrap();
        assert_eq!(batch.len(), 6);
        assert!(batch.is_success());
    }

    #[test]
    fn test_records() {
        let features = vec![RemoteFeature::new("search").with_id(3), RemoteFeature::new("gone")];
        let batch = settle_all(
            &features,
            |f| f.key.clone(),
            |f| match f.id {
                Some(_) => Ok(f.clone()),
                None => Err(Error::MissingRemoteId {
                    key: f.key.clone(),
                    action: "delete",
                }),
            },
        )
        .unwrap();

        let records = batch.records();
        assert_eq!(records[0].status, SettleStatus::Fulfilled);
        assert_eq!(records[0].detail, "search (id 3)");
        assert_eq!(records[1].status, SettleStatus::Rejected);
        assert!(records[1].detail.contains("Could not find id for \"gone\""));
    }
}
