use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors that can occur in the logging library
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    #[error("Time error: {0}")]
    Time(#[from] time::error::Error),
    /// Creating the directory or opening the file for a new rotation failed.
    /// The sink keeps its previous file and retries on the next write.
    #[error("rotation to {} failed: {source}", path.display())]
    RotationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A write arrived while the sink was switching files.
    #[error("rotation in progress")]
    RotationInProgress,
    /// The "latest" symlink could not be repointed.
    #[error("failed to update symlink {}: {source}", link.display())]
    SymlinkUpdateFailed {
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Internal frames could not be located in a captured stack.
    #[error("stack capture degraded: internal frames were left in the trace")]
    StackCaptureDegraded,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
