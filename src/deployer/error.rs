// ABOUTME: Error types for deployer operations.
// ABOUTME: Maps host and protocol failures onto one taxonomy with a programmatic kind.

use std::time::Duration;

use crate::host::HostError;
use crate::monitor::MonitorEvent;
use crate::types::MountPath;

/// Errors surfaced by deploy, undeploy, redeploy, start and stop.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Malformed path or missing parameter. Nothing was changed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An artifact is already deployed at this path.
    #[error("mount path already in use: {0}")]
    PathInUse(MountPath),

    /// Nothing is deployed at this path.
    #[error("no artifact deployed at {0}")]
    NotFound(MountPath),

    /// Writing the artifact failed; a partial artifact may remain on disk.
    #[error("artifact transfer failed: {0}")]
    TransferFailed(String),

    /// The artifact was placed but could not be started.
    #[error("artifact could not be started: {0}")]
    ActivationFailed(String),

    /// The monitor did not observe the expected state in time.
    /// The underlying action is left in place and may still complete.
    #[error("{path} was not {expected:?} within {} ms", timeout.as_millis())]
    DeploymentTimedOut {
        path: MountPath,
        expected: MonitorEvent,
        timeout: Duration,
    },

    /// The install or uninstall mechanism itself failed.
    #[error("deployment action failed: {0}")]
    UnderlyingActionFailed(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Validation,
    PathInUse,
    NotFound,
    TransferFailed,
    ActivationFailed,
    DeploymentTimedOut,
    UnderlyingActionFailed,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Validation(_) => DeployErrorKind::Validation,
            DeployError::PathInUse(_) => DeployErrorKind::PathInUse,
            DeployError::NotFound(_) => DeployErrorKind::NotFound,
            DeployError::TransferFailed(_) => DeployErrorKind::TransferFailed,
            DeployError::ActivationFailed(_) => DeployErrorKind::ActivationFailed,
            DeployError::DeploymentTimedOut { .. } => DeployErrorKind::DeploymentTimedOut,
            DeployError::UnderlyingActionFailed(_) => DeployErrorKind::UnderlyingActionFailed,
        }
    }
}

impl From<HostError> for DeployError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::PathInUse(path) => DeployError::PathInUse(path),
            HostError::NotFound(path) => DeployError::NotFound(path),
            HostError::Validation(msg) => DeployError::Validation(msg),
            e @ HostError::TransferFailed { .. } => DeployError::TransferFailed(e.to_string()),
            e @ HostError::ActivationFailed { .. } => DeployError::ActivationFailed(e.to_string()),
            e @ HostError::StopFailed { .. } => DeployError::UnderlyingActionFailed(e.to_string()),
        }
    }
}
