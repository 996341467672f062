// ABOUTME: Error types for server-side deployment actions.
// ABOUTME: Separates validation, registry conflicts, transfer and activation failures.

use std::path::PathBuf;

use crate::registry::RegistryError;
use crate::types::MountPath;

/// Errors from placing, starting, stopping or removing a context.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Another context is deployed (or being deployed) at this path.
    #[error("mount path already in use: {0}")]
    PathInUse(MountPath),

    /// Nothing is deployed at this path.
    #[error("no context deployed at {0}")]
    NotFound(MountPath),

    /// The request itself was malformed.
    #[error("{0}")]
    Validation(String),

    /// Writing the artifact failed. A partial file may remain at `location`.
    #[error("failed to write artifact to {}: {reason}", location.display())]
    TransferFailed { location: PathBuf, reason: String },

    /// The artifact was placed but could not be started; no context was registered.
    #[error("failed to start context {path}: {reason}")]
    ActivationFailed { path: MountPath, reason: String },

    /// The running context refused to stop; it stays registered.
    #[error("failed to stop context {path}: {reason}")]
    StopFailed { path: MountPath, reason: String },
}

impl From<RegistryError> for HostError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicatePath(path) => HostError::PathInUse(path),
            RegistryError::NotFound(path) => HostError::NotFound(path),
        }
    }
}
