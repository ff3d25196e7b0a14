use ftdsync_core::{ConfigError, SyncError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("run finished without new records ({failed} of {attempted} distributions failed)")]
    Unsuccessful { attempted: usize, failed: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Sync(SyncError::Config(_)) => 2,
            Self::Sync(SyncError::MissingPrerequisite { .. }) => 3,
            Self::Sync(SyncError::Io(_)) => 10,
            Self::Sync(_) => 1,
            Self::Unsuccessful { .. } => 4,
            Self::Serialization(_) => 5,
            Self::Io(_) => 10,
        }
    }
}
