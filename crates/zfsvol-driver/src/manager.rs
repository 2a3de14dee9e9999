use crate::error::{DriverError, Result};
use crate::policy::{self, Step};
use crate::registry::{Registry, VolumeProperties};
use crate::resolver::MountpointResolver;
use crate::state::StateFile;
use crate::storage::Pool;
use crate::traits::VolumeDriver;
use crate::translator::PropertyTranslator;
use crate::types::{Capabilities, DriverConfig, Scope, Volume};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Volume lifecycle manager
///
/// Owns the registry behind a single mutex. Create and Remove hold the lock
/// across the pool call, the registry update and the state write, so the
/// existence check and the insert are one unit and the state file always
/// reflects a consistent registry. Reads copy what they need under the lock
/// and query the pool afterwards.
pub struct VolumeManager {
    pool: Arc<dyn Pool>,
    translator: PropertyTranslator,
    resolver: MountpointResolver,
    state: StateFile,
    registry: Mutex<Registry>,
}

impl VolumeManager {
    /// Validate the environment and load persisted state
    ///
    /// Fails when the root dataset is missing, the volume mount directory
    /// cannot be created or the state file is unreadable.
    pub async fn open(config: DriverConfig, pool: Arc<dyn Pool>) -> Result<Self> {
        if !pool.dataset_exists(&config.root_dataset).await? {
            return Err(DriverError::root_dataset_missing(&config.root_dataset));
        }

        let volumes_mount_path = config.volumes_mount_path();
        tokio::fs::create_dir_all(&volumes_mount_path)
            .await
            .map_err(|e| DriverError::io(volumes_mount_path.display().to_string(), &e))?;

        let state = StateFile::new(config.state_path());
        let registry = state.load().await?;

        info!(
            "Volume manager ready: root_dataset={}, volume_base={}, volumes={}",
            config.root_dataset,
            config.volume_base.display(),
            registry.len()
        );

        Ok(Self {
            pool,
            translator: PropertyTranslator::new(config.root_dataset, volumes_mount_path),
            resolver: MountpointResolver::new(config.mount_strategy),
            state,
            registry: Mutex::new(registry),
        })
    }

    /// Copy of the current registry
    pub async fn registry(&self) -> Registry {
        self.registry.lock().await.clone()
    }

    async fn lookup(&self, name: &str) -> Result<VolumeProperties> {
        self.registry
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::volume_not_found(name))
    }

    async fn resolve_mountpoint(&self, props: &VolumeProperties) -> Result<String> {
        let dataset = self.pool.get_dataset(&props.dataset_fqn).await?;
        let mp = self.pool.mountpoint(&dataset).await?;
        Ok(self.resolver.resolve(&mp))
    }

    async fn resolve_volume(&self, name: &str, props: &VolumeProperties) -> Result<Volume> {
        let dataset = policy::apply(
            Step::DatasetLookup,
            name,
            self.pool.get_dataset(&props.dataset_fqn).await,
        )?
        .ok_or_else(|| DriverError::zfs_error(format!("dataset of '{}' unavailable", name)))?;

        let mountpoint = policy::apply(Step::Mountpoint, name, self.pool.mountpoint(&dataset).await)?
            .ok_or_else(|| DriverError::zfs_error(format!("mountpoint of '{}' unavailable", name)))?;

        let created_at = policy::apply(Step::CreationTime, name, self.pool.creation(&dataset).await)?;

        Ok(Volume {
            name: name.to_string(),
            mountpoint: self.resolver.resolve(&mountpoint),
            created_at,
        })
    }

    async fn persist(&self, registry: &Registry) {
        // A failed write is logged by the policy; the pool change stands
        let _persisted = policy::apply(
            Step::PersistState,
            &self.state.path().display().to_string(),
            self.state.save(registry).await,
        );
    }
}

/// Reject names that cannot be a single dataset path component
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DriverError::invalid_volume_name(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(DriverError::invalid_volume_name(name, "name is a relative path"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '/' | '@' | '#') || c.is_whitespace())
    {
        return Err(DriverError::invalid_volume_name(
            name,
            format!("character '{}' is not allowed", c.escape_default()),
        ));
    }
    Ok(())
}

#[async_trait]
impl VolumeDriver for VolumeManager {
    async fn create(&self, name: &str, options: BTreeMap<String, String>) -> Result<()> {
        debug!("Create: name={}, options={:?}", name, options);
        validate_name(name)?;
        let plan = self.translator.translate(name, options)?;

        let mut registry = self.registry.lock().await;

        if let Some(existing) = registry.get(name) {
            return Err(DriverError::volume_already_exists(
                name,
                &existing.dataset_fqn,
            ));
        }
        if self.pool.dataset_exists(&plan.dataset).await? {
            return Err(DriverError::volume_already_exists(name, &plan.dataset));
        }

        tokio::fs::create_dir_all(&plan.mount_path)
            .await
            .map_err(|e| DriverError::io(plan.mount_path.display().to_string(), &e))?;

        self.pool
            .create_dataset_recursive(&plan.dataset, &plan.properties)
            .await?;

        registry.insert(name, VolumeProperties::new(&plan.dataset));
        self.persist(&registry).await;

        info!("Created volume '{}' on dataset '{}'", name, plan.dataset);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Volume>> {
        debug!("List");
        let entries = self.registry.lock().await.entries();

        let mut volumes = Vec::with_capacity(entries.len());
        for (name, props) in entries {
            let resolved = policy::apply(
                Step::ListEntry,
                &name,
                self.resolve_volume(&name, &props).await,
            )?;
            if let Some(volume) = resolved {
                volumes.push(volume);
            }
        }
        Ok(volumes)
    }

    async fn get(&self, name: &str) -> Result<Volume> {
        debug!("Get: name={}", name);
        let props = self.lookup(name).await?;
        self.resolve_volume(name, &props).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        debug!("Remove: name={}", name);
        let mut registry = self.registry.lock().await;

        let props = registry
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::volume_not_found(name))?;

        let dataset = self.pool.get_dataset(&props.dataset_fqn).await?;
        self.pool.destroy(&dataset).await?;

        registry.remove(name);
        self.persist(&registry).await;
        drop(registry);

        let mount_path = self.translator.mount_path(name);
        let _cleaned = policy::apply(
            Step::MountDirCleanup,
            name,
            tokio::fs::remove_dir(&mount_path)
                .await
                .map_err(|e| DriverError::io(mount_path.display().to_string(), &e)),
        );

        info!("Removed volume '{}' (dataset '{}')", name, props.dataset_fqn);
        Ok(())
    }

    async fn path(&self, name: &str) -> Result<String> {
        debug!("Path: name={}", name);
        let props = self.lookup(name).await?;
        self.resolve_mountpoint(&props).await
    }

    async fn mount(&self, name: &str, id: &str) -> Result<String> {
        debug!("Mount: name={}, id={}", name, id);
        let props = self.lookup(name).await?;
        self.resolve_mountpoint(&props).await
    }

    async fn unmount(&self, name: &str, id: &str) -> Result<()> {
        debug!("Unmount: name={}, id={}", name, id);
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        debug!("Capabilities");
        Capabilities {
            scope: Scope::Local,
        }
    }
}
