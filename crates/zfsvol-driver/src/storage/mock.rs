use crate::error::{DriverError, Result};
use crate::storage::{Dataset, Pool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct MockDataset {
    properties: BTreeMap<String, String>,
    created: DateTime<Utc>,
}

/// In-memory pool for tests and development hosts without ZFS
///
/// Datasets live in a map keyed by full name. Mountpoints default to
/// `/<dataset>` like ZFS does, unless a `mountpoint` property was given at
/// creation. Individual failures can be injected to exercise the driver's
/// tolerance policy.
#[derive(Default)]
pub struct MockPool {
    datasets: Arc<RwLock<BTreeMap<String, MockDataset>>>,
    failing_destroy: Arc<RwLock<HashSet<String>>>,
    failing_lookup: Arc<RwLock<HashSet<String>>>,
    no_creation_time: Arc<RwLock<bool>>,
    create_fails: Arc<RwLock<bool>>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset as if it had been created outside the driver.
    pub async fn insert_dataset(&self, dataset: &str) {
        self.datasets.write().await.insert(
            dataset.to_string(),
            MockDataset {
                properties: BTreeMap::new(),
                created: Utc::now(),
            },
        );
    }

    /// Properties the dataset was created with, if it exists.
    pub async fn properties(&self, dataset: &str) -> Option<BTreeMap<String, String>> {
        self.datasets
            .read()
            .await
            .get(dataset)
            .map(|d| d.properties.clone())
    }

    pub async fn contains(&self, dataset: &str) -> bool {
        self.datasets.read().await.contains_key(dataset)
    }

    pub async fn fail_destroy(&self, dataset: &str) {
        self.failing_destroy.write().await.insert(dataset.to_string());
    }

    pub async fn fail_lookup(&self, dataset: &str) {
        self.failing_lookup.write().await.insert(dataset.to_string());
    }

    pub async fn fail_create(&self, fail: bool) {
        *self.create_fails.write().await = fail;
    }

    /// Make `creation` fail for every dataset.
    pub async fn hide_creation_time(&self) {
        *self.no_creation_time.write().await = true;
    }
}

#[async_trait]
impl Pool for MockPool {
    async fn dataset_exists(&self, dataset: &str) -> Result<bool> {
        Ok(self.datasets.read().await.contains_key(dataset))
    }

    async fn create_dataset_recursive(
        &self,
        dataset: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<Dataset> {
        if *self.create_fails.read().await {
            return Err(DriverError::zfs_error(format!(
                "mock: cannot create '{}'",
                dataset
            )));
        }

        let mut ds = self.datasets.write().await;
        if ds.contains_key(dataset) {
            return Err(DriverError::zfs_error(format!(
                "cannot create '{}': dataset already exists",
                dataset
            )));
        }

        // Parents are implied, like `zfs create -p`
        let mut parent = dataset;
        while let Some((p, _)) = parent.rsplit_once('/') {
            ds.entry(p.to_string()).or_insert_with(|| MockDataset {
                properties: BTreeMap::new(),
                created: Utc::now(),
            });
            parent = p;
        }

        ds.insert(
            dataset.to_string(),
            MockDataset {
                properties: properties.clone(),
                created: Utc::now(),
            },
        );
        debug!("Mock: created dataset {}", dataset);
        Ok(Dataset::new(dataset))
    }

    async fn get_dataset(&self, dataset: &str) -> Result<Dataset> {
        if self.failing_lookup.read().await.contains(dataset) {
            return Err(DriverError::zfs_error(format!(
                "mock: lookup of '{}' failed",
                dataset
            )));
        }
        if !self.datasets.read().await.contains_key(dataset) {
            return Err(DriverError::zfs_error(format!(
                "cannot open '{}': dataset does not exist",
                dataset
            )));
        }
        Ok(Dataset::new(dataset))
    }

    async fn mountpoint(&self, dataset: &Dataset) -> Result<String> {
        let ds = self.datasets.read().await;
        let entry = ds.get(&dataset.name).ok_or_else(|| {
            DriverError::zfs_error(format!("cannot open '{}': dataset does not exist", dataset.name))
        })?;
        Ok(entry
            .properties
            .get("mountpoint")
            .cloned()
            .unwrap_or_else(|| format!("/{}", dataset.name)))
    }

    async fn creation(&self, dataset: &Dataset) -> Result<DateTime<Utc>> {
        if *self.no_creation_time.read().await {
            return Err(DriverError::zfs_error("mock: creation time unavailable"));
        }
        self.datasets
            .read()
            .await
            .get(&dataset.name)
            .map(|d| d.created)
            .ok_or_else(|| {
                DriverError::zfs_error(format!(
                    "cannot open '{}': dataset does not exist",
                    dataset.name
                ))
            })
    }

    async fn destroy(&self, dataset: &Dataset) -> Result<()> {
        if self.failing_destroy.read().await.contains(&dataset.name) {
            return Err(DriverError::zfs_error(format!(
                "cannot destroy '{}': dataset is busy",
                dataset.name
            )));
        }
        if self.datasets.write().await.remove(&dataset.name).is_none() {
            return Err(DriverError::zfs_error(format!(
                "cannot open '{}': dataset does not exist",
                dataset.name
            )));
        }
        debug!("Mock: destroyed dataset {}", dataset.name);
        Ok(())
    }
}
