use crate::resolver::MountStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default base directory for mount directories and the state file
pub const DEFAULT_VOLUME_BASE: &str = "/docker";

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Root dataset volumes are created under (e.g. "rpool/docker")
    pub root_dataset: String,
    /// Base directory; volumes mount under `{base}/volumes`, state lives in `{base}/state.json`
    pub volume_base: PathBuf,
    /// How pool-reported mount paths are translated for the host
    pub mount_strategy: MountStrategy,
}

impl DriverConfig {
    pub fn new(root_dataset: impl Into<String>, volume_base: impl Into<PathBuf>) -> Self {
        Self {
            root_dataset: root_dataset.into(),
            volume_base: volume_base.into(),
            mount_strategy: MountStrategy::Direct,
        }
    }

    pub fn with_mount_strategy(mut self, strategy: MountStrategy) -> Self {
        self.mount_strategy = strategy;
        self
    }

    /// Directory holding one mount directory per volume
    pub fn volumes_mount_path(&self) -> PathBuf {
        self.volume_base.join("volumes")
    }

    /// Location of the persisted registry
    pub fn state_path(&self) -> PathBuf {
        self.volume_base.join("state.json")
    }
}

/// Caller-visible view of a volume, resolved at query time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub mountpoint: String,
    /// Absent when the pool cannot report a creation time
    pub created_at: Option<DateTime<Utc>>,
}

/// Visibility scope of the driver's volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Volumes exist on this host only
    Local,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "local",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Driver capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub scope: Scope,
}
