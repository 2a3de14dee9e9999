mod mock;
mod zfs;

pub use mock::MockPool;
pub use zfs::ZfsPool;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Handle to a dataset that was confirmed to exist at lookup time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Pool-management capability set used by the volume manager
///
/// `ZfsPool` drives the real `zfs(8)` tooling. `MockPool` keeps datasets in
/// memory so the lifecycle can be exercised without a pool.
#[async_trait]
pub trait Pool: Send + Sync {
    /// Whether a dataset with this exact name exists.
    async fn dataset_exists(&self, dataset: &str) -> Result<bool>;

    /// Create a dataset and any missing parents, applying `properties` to the leaf.
    async fn create_dataset_recursive(
        &self,
        dataset: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<Dataset>;

    /// Look up an existing dataset.
    async fn get_dataset(&self, dataset: &str) -> Result<Dataset>;

    /// Mount path the pool reports for the dataset.
    async fn mountpoint(&self, dataset: &Dataset) -> Result<String>;

    /// Creation time the pool reports for the dataset.
    async fn creation(&self, dataset: &Dataset) -> Result<DateTime<Utc>>;

    /// Destroy the dataset (non-recursive).
    async fn destroy(&self, dataset: &Dataset) -> Result<()>;
}
