use crate::command::{exec, exec_unchecked};
use crate::error::{DriverError, Result};
use crate::storage::{Dataset, Pool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Pool backend that shells out to `zfs(8)`
#[derive(Debug, Clone)]
pub struct ZfsPool {
    binary: String,
}

impl ZfsPool {
    pub fn new() -> Self {
        Self::with_binary("zfs")
    }

    /// Use a different `zfs` executable (e.g. an absolute path inside a plugin rootfs)
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn get_property(&self, dataset: &str, property: &str, parseable: bool) -> Result<String> {
        let flags = if parseable { "-Hp" } else { "-H" };
        let output = exec(&self.binary, &["get", flags, "-o", "value", property, dataset]).await?;
        let value = output.first_line();
        if value.is_empty() || value == "-" {
            return Err(DriverError::zfs_error(format!(
                "property '{}' is not set on '{}'",
                property, dataset
            )));
        }
        Ok(value.to_string())
    }
}

impl Default for ZfsPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the argument list for `zfs create -p -o k=v ... <dataset>`
fn create_args(dataset: &str, properties: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec!["create".to_string(), "-p".to_string()];
    for (key, value) in properties {
        args.push("-o".to_string());
        args.push(format!("{}={}", key, value));
    }
    args.push(dataset.to_string());
    args
}

/// Parse the `creation` property as printed by `zfs get -Hp` (epoch seconds)
fn parse_creation(dataset: &str, raw: &str) -> Result<DateTime<Utc>> {
    let secs: i64 = raw.parse().map_err(|_| {
        DriverError::zfs_error(format!(
            "unparseable creation time '{}' for '{}'",
            raw, dataset
        ))
    })?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        DriverError::zfs_error(format!(
            "creation time {} for '{}' is out of range",
            secs, dataset
        ))
    })
}

#[async_trait]
impl Pool for ZfsPool {
    async fn dataset_exists(&self, dataset: &str) -> Result<bool> {
        let output = exec_unchecked(&self.binary, &["list", "-H", "-o", "name", dataset]).await?;
        Ok(output.success())
    }

    async fn create_dataset_recursive(
        &self,
        dataset: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<Dataset> {
        info!("Creating ZFS dataset: {}", dataset);
        let args = create_args(dataset, properties);
        exec(&self.binary, args.as_slice()).await?;
        info!("ZFS dataset created: {}", dataset);
        Ok(Dataset::new(dataset))
    }

    async fn get_dataset(&self, dataset: &str) -> Result<Dataset> {
        let output = exec(&self.binary, &["list", "-H", "-o", "name", dataset]).await?;
        let name = output.first_line();
        if name != dataset {
            return Err(DriverError::zfs_error(format!(
                "lookup of '{}' returned '{}'",
                dataset, name
            )));
        }
        Ok(Dataset::new(name))
    }

    async fn mountpoint(&self, dataset: &Dataset) -> Result<String> {
        let mp = self.get_property(&dataset.name, "mountpoint", false).await?;
        debug!("Mountpoint of {}: {}", dataset.name, mp);
        Ok(mp)
    }

    async fn creation(&self, dataset: &Dataset) -> Result<DateTime<Utc>> {
        let raw = self.get_property(&dataset.name, "creation", true).await?;
        parse_creation(&dataset.name, &raw)
    }

    async fn destroy(&self, dataset: &Dataset) -> Result<()> {
        info!("Destroying ZFS dataset: {}", dataset.name);
        exec(&self.binary, &["destroy", dataset.name.as_str()]).await?;
        info!("ZFS dataset destroyed: {}", dataset.name);
        Ok(())
    }
}
