// Allow unused assignments for diagnostic fields - they're used by the thiserror/miette macros
#![allow(unused_assignments)]

//! Docker volume driver backed by ZFS datasets.
//!
//! Maps volume names to datasets, persists the mapping to a JSON state file
//! and translates volume options into dataset properties.

pub mod command;
pub mod error;
pub mod manager;
pub mod policy;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod storage;
pub mod traits;
pub mod translator;
pub mod types;

// Re-export primary types
pub use error::{DriverError, Result};
pub use manager::VolumeManager;
pub use registry::{Registry, VolumeProperties};
pub use resolver::{MountStrategy, MountpointResolver};
pub use state::StateFile;
pub use traits::VolumeDriver;
pub use translator::{DatasetPlan, PropertyTranslator};
pub use types::{Capabilities, DriverConfig, Scope, Volume, DEFAULT_VOLUME_BASE};

// Re-export storage types
pub use storage::{Dataset, MockPool, Pool, ZfsPool};
