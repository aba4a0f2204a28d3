//! Refresh capability
//!
//! Refreshed state comes from an external collaborator behind the narrow
//! [`Refresher`] contract. This module also provides [`SnapshotRefresher`],
//! which serves previously captured state, and [`refresh_all`] for driving
//! many resources at once.

use crate::document::read_document;
use crate::resource::{Address, Resource};
use crate::value::Value;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Refresh failure for a single resource
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no state for {address} (import id {import_id})")]
    NotFound { address: String, import_id: String },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Source of confirmed resource state
///
/// Implementations must tolerate repeated calls for the same resource.
#[async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(
        &self,
        address: &Address,
        prior_state: &BTreeMap<String, String>,
        import_id: &str,
    ) -> Result<Value, RefreshError>;
}

/// Serves state captured earlier, keyed by resource type then import id
#[derive(Debug, Clone, Default)]
pub struct SnapshotRefresher {
    states: HashMap<String, HashMap<String, Value>>,
}

impl SnapshotRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot document (JSON or YAML)
    ///
    /// ```yaml
    /// datadog_integration_aws_log_collection:
    ///   "123456789012":
    ///     account_id: "123456789012"
    /// ```
    pub fn from_path(path: &Path) -> Result<Self> {
        let states: HashMap<String, HashMap<String, Value>> = read_document(path)?;
        let count: usize = states.values().map(HashMap::len).sum();
        tracing::info!("Loaded {} snapshot states from {:?}", count, path);
        Ok(Self { states })
    }

    pub fn insert(&mut self, resource_type: &str, import_id: &str, state: Value) {
        self.states
            .entry(resource_type.to_string())
            .or_default()
            .insert(import_id.to_string(), state);
    }
}

#[async_trait]
impl Refresher for SnapshotRefresher {
    async fn refresh(
        &self,
        address: &Address,
        _prior_state: &BTreeMap<String, String>,
        import_id: &str,
    ) -> Result<Value, RefreshError> {
        self.states
            .get(&address.resource_type)
            .and_then(|by_id| by_id.get(import_id))
            .cloned()
            .ok_or_else(|| RefreshError::NotFound {
                address: address.to_string(),
                import_id: import_id.to_string(),
            })
    }
}

/// Outcome counts of a batch refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Refresh every resource with at most `concurrency` refreshes in flight
///
/// Each resource is borrowed by exactly one in-flight refresh. Failures are
/// counted, never propagated.
pub async fn refresh_all(
    resources: &mut [Resource],
    refresher: &dyn Refresher,
    concurrency: usize,
) -> RefreshSummary {
    let outcomes: Vec<bool> = stream::iter(resources.iter_mut())
        .map(|resource| resource.refresh(refresher))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let refreshed = outcomes.iter().filter(|ok| **ok).count();
    RefreshSummary {
        refreshed,
        failed: outcomes.len() - refreshed,
    }
}
