use miette::Diagnostic;
use thiserror::Error;

/// Driver error type for volume lifecycle operations
#[derive(Error, Debug, Diagnostic)]
pub enum DriverError {
    /// Volume name cannot be used as a dataset component
    #[error("Invalid volume name '{name}': {reason}")]
    #[diagnostic(
        code(zfsvol::driver::invalid_volume_name),
        help("Volume names must be non-empty and must not contain '/', '@', '#' or whitespace")
    )]
    InvalidVolumeName {
        #[allow(unused)]
        name: String,
        #[allow(unused)]
        reason: String,
    },

    /// Caller supplied an option the driver computes itself
    #[error("The '{option}' option is not supported")]
    #[diagnostic(
        code(zfsvol::driver::reserved_option),
        help("Mount paths are assigned by the driver under the volume base directory. Remove the option and retry")
    )]
    ReservedOption {
        #[allow(unused)]
        option: String,
    },

    /// Target dataset already exists in the pool
    #[error("Volume already exists: {name} (dataset '{dataset}')")]
    #[diagnostic(
        code(zfsvol::driver::volume_already_exists),
        help("Remove the existing volume first, or pick a different name. Datasets created outside the driver are detected too: check with `zfs list {dataset}`")
    )]
    VolumeAlreadyExists {
        #[allow(unused)]
        name: String,
        #[allow(unused)]
        dataset: String,
    },

    /// Volume is not known to the registry
    #[error("Volume not found: {name}")]
    #[diagnostic(
        code(zfsvol::driver::volume_not_found),
        help("Verify the volume name is correct. Use `docker volume ls` to see volumes managed by this driver")
    )]
    VolumeNotFound {
        #[allow(unused)]
        name: String,
    },

    /// ZFS error
    #[error("ZFS operation failed: {message}")]
    #[diagnostic(
        code(zfsvol::driver::zfs_error),
        help("Verify the dataset exists with `zfs list`. Ensure sufficient disk space and proper permissions")
    )]
    ZfsError {
        #[allow(unused)]
        message: String,
    },

    /// Command execution failed
    #[error("Command '{command}' failed with exit code {exit_code}")]
    #[diagnostic(code(zfsvol::driver::command_failed), help("stderr: {stderr}"))]
    CommandFailed {
        #[allow(unused)]
        command: String,
        #[allow(unused)]
        exit_code: i32,
        #[allow(unused)]
        stderr: String,
    },

    /// Root dataset missing at startup
    #[error("Root dataset '{dataset}' does not exist")]
    #[diagnostic(
        code(zfsvol::driver::root_dataset_missing),
        help("Create it first, e.g. `zfs create -p {dataset}`, or pass an existing dataset with --root-dataset")
    )]
    RootDatasetMissing {
        #[allow(unused)]
        dataset: String,
    },

    /// Persisted state could not be parsed
    #[error("State file '{path}' is corrupt: {message}")]
    #[diagnostic(
        code(zfsvol::driver::state_corrupt),
        help("The registry will not be loaded from a damaged file. Repair or move it aside and reconcile against `zfs list` manually")
    )]
    StateCorrupt {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
    },

    /// Registry could not be encoded for writing
    #[error("Failed to encode state for '{path}': {message}")]
    #[diagnostic(
        code(zfsvol::driver::state_encode),
        help("This is a bug in the driver; the in-memory registry is kept and the write will be retried on the next mutation")
    )]
    StateEncode {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
    },

    /// Filesystem error
    #[error("I/O error on '{path}': {message}")]
    #[diagnostic(
        code(zfsvol::driver::io_error),
        help("Check filesystem permissions and available disk space")
    )]
    Io {
        #[allow(unused)]
        path: String,
        #[allow(unused)]
        message: String,
    },
}

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

impl DriverError {
    pub fn invalid_volume_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVolumeName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn reserved_option(option: impl Into<String>) -> Self {
        Self::ReservedOption {
            option: option.into(),
        }
    }

    pub fn volume_already_exists(name: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self::VolumeAlreadyExists {
            name: name.into(),
            dataset: dataset.into(),
        }
    }

    pub fn volume_not_found(name: impl Into<String>) -> Self {
        Self::VolumeNotFound { name: name.into() }
    }

    pub fn zfs_error(message: impl Into<String>) -> Self {
        Self::ZfsError {
            message: message.into(),
        }
    }

    pub fn command_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    pub fn root_dataset_missing(dataset: impl Into<String>) -> Self {
        Self::RootDatasetMissing {
            dataset: dataset.into(),
        }
    }

    pub fn state_corrupt(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StateCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn state_encode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StateEncode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error was raised before any pool operation ran
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidVolumeName { .. } | Self::ReservedOption { .. }
        )
    }
}
