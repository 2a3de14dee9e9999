//! Which failures abort a request and which are logged and tolerated.

use crate::error::Result;
use tracing::{error, warn};

/// A step inside a lifecycle operation that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Resolving a registered volume to its dataset
    DatasetLookup,
    /// Reading the dataset's mount path
    Mountpoint,
    /// Reading the dataset's creation time
    CreationTime,
    /// Resolving one registry entry while listing
    ListEntry,
    /// Rewriting the state file after a mutation
    PersistState,
    /// Removing a volume's mount directory after destroy
    MountDirCleanup,
}

/// Action taken when a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Return the error to the caller
    Propagate,
    /// Log and drop the optional field the step would have produced
    LogAndOmit,
    /// Log and carry on with the rest of the operation
    LogAndContinue,
}

impl Step {
    pub const fn on_failure(self) -> OnFailure {
        match self {
            Step::DatasetLookup | Step::Mountpoint => OnFailure::Propagate,
            Step::CreationTime => OnFailure::LogAndOmit,
            Step::ListEntry | Step::PersistState | Step::MountDirCleanup => {
                OnFailure::LogAndContinue
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::DatasetLookup => "dataset_lookup",
            Step::Mountpoint => "mountpoint",
            Step::CreationTime => "creation_time",
            Step::ListEntry => "list_entry",
            Step::PersistState => "persist_state",
            Step::MountDirCleanup => "mount_dir_cleanup",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Apply the step's failure policy to `result`
///
/// `Ok(None)` means the step failed and the failure was tolerated.
pub fn apply<T>(step: Step, subject: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => match step.on_failure() {
            OnFailure::Propagate => Err(e),
            OnFailure::LogAndOmit => {
                warn!(step = %step, subject, error = %e, "Omitting field after failed step");
                Ok(None)
            }
            OnFailure::LogAndContinue => {
                error!(step = %step, subject, error = %e, "Continuing after failed step");
                Ok(None)
            }
        },
    }
}
