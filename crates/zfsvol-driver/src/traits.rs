use crate::error::Result;
use crate::types::{Capabilities, Volume};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Operation set served to the container runtime
///
/// The transport depends on this trait only, which lets handler tests plug
/// in any implementation. `VolumeManager` is the production one.
#[async_trait]
pub trait VolumeDriver: Send + Sync {
    /// Create a volume; `options` is consumed by translation
    async fn create(&self, name: &str, options: BTreeMap<String, String>) -> Result<()>;

    /// All known volumes whose dataset could be resolved
    async fn list(&self) -> Result<Vec<Volume>>;

    /// One volume, with creation time when available
    async fn get(&self, name: &str) -> Result<Volume>;

    /// Destroy the volume's dataset and forget it
    async fn remove(&self, name: &str) -> Result<()>;

    /// Host-usable mount path
    async fn path(&self, name: &str) -> Result<String>;

    /// Same as `path`; datasets stay mounted so nothing is attached
    async fn mount(&self, name: &str, id: &str) -> Result<String>;

    /// No-op counterpart to `mount`
    async fn unmount(&self, name: &str, id: &str) -> Result<()>;

    fn capabilities(&self) -> Capabilities;
}
