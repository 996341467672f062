// ABOUTME: A deployed context: mount path, backing artifact location, running flag.
// ABOUTME: Shared between the registry and whoever starts or stops it.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::MountPath;

/// Runtime handle for an artifact served under a mount path.
#[derive(Debug)]
pub struct DeployedContext {
    mount_path: MountPath,
    location: PathBuf,
    running: AtomicBool,
    deployed_at: DateTime<Utc>,
}

impl DeployedContext {
    /// A context that has not been started yet.
    pub fn new(mount_path: MountPath, location: impl Into<PathBuf>) -> Self {
        Self {
            mount_path,
            location: location.into(),
            running: AtomicBool::new(false),
            deployed_at: Utc::now(),
        }
    }

    pub fn mount_path(&self) -> &MountPath {
        &self.mount_path
    }

    /// Where the artifact backing this context lives on disk.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }
}
