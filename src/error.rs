// ABOUTME: Application-wide error types for stevedore.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deployer::DeployError;
use crate::endpoint::ServeError;
use crate::probe::ProbeTargetError;
use crate::types::MountPathError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid mount path: {0}")]
    MountPath(#[from] MountPathError),

    #[error(transparent)]
    ProbeTarget(#[from] ProbeTargetError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Serve(#[from] ServeError),

    #[error("{target} did not come up within {} ms", timeout.as_millis())]
    NotDeployed {
        target: String,
        timeout: std::time::Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
