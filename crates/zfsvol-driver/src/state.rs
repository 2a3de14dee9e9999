use crate::error::{DriverError, Result};
use crate::registry::Registry;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file holding the registry between restarts
///
/// Read once at startup and fully rewritten after every mutation.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry; a missing file is an empty registry
    pub async fn load(&self) -> Result<Registry> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No initial state found at {}", self.path.display());
                return Ok(Registry::new());
            }
            Err(e) => return Err(DriverError::io(self.path.display().to_string(), &e)),
        };

        let registry: Registry = serde_json::from_slice(&data).map_err(|e| {
            DriverError::state_corrupt(self.path.display().to_string(), e.to_string())
        })?;

        debug!(
            "Loaded {} volumes from {}",
            registry.len(),
            self.path.display()
        );
        Ok(registry)
    }

    /// Overwrite the file with the full registry
    pub async fn save(&self, registry: &Registry) -> Result<()> {
        let data = serde_json::to_vec(registry).map_err(|e| {
            DriverError::state_encode(self.path.display().to_string(), e.to_string())
        })?;

        tokio::fs::write(&self.path, data)
            .await
            .map_err(|e| DriverError::io(self.path.display().to_string(), &e))?;

        debug!("Saved {} volumes to {}", registry.len(), self.path.display());
        Ok(())
    }
}
