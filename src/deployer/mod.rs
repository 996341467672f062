// ABOUTME: Deployer abstraction: deploy, undeploy, redeploy, start and stop artifacts.
// ABOUTME: Operations given a monitor block until it confirms the expected state.

mod error;
mod local;
mod remote;

pub use error::{DeployError, DeployErrorKind};
pub use local::LocalDeployer;
pub use remote::RemoteDeployer;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::monitor::{DeploymentMonitor, MonitorEvent};
use crate::probe::Prober;
use crate::types::{Artifact, MountPath};

/// How a deployer reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployerKind {
    /// Manipulates a server's deployment directory in-process.
    Installed,
    /// Talks to a server's deploy endpoint over the network.
    Remote,
}

impl fmt::Display for DeployerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployerKind::Installed => write!(f, "installed"),
            DeployerKind::Remote => write!(f, "remote"),
        }
    }
}

/// Unit deployment operations against one server.
#[async_trait]
pub trait Deployer: Send + Sync {
    fn kind(&self) -> DeployerKind;

    /// Install and start the artifact; with a monitor, wait until it answers.
    async fn deploy(
        &self,
        artifact: &Artifact,
        monitor: Option<DeploymentMonitor>,
    ) -> Result<(), DeployError>;

    /// Stop and remove the artifact; with a monitor, wait until it stops answering.
    async fn undeploy(
        &self,
        artifact: &Artifact,
        monitor: Option<DeploymentMonitor>,
    ) -> Result<(), DeployError>;

    /// Undeploy then deploy the same mount path; the monitor confirms the deploy.
    ///
    /// A path with nothing deployed counts as already undeployed.
    async fn redeploy(
        &self,
        artifact: &Artifact,
        monitor: Option<DeploymentMonitor>,
    ) -> Result<(), DeployError> {
        match self.undeploy(artifact, None).await {
            Ok(()) | Err(DeployError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.deploy(artifact, monitor).await
    }

    /// Start an already-deployed artifact.
    async fn start(&self, artifact: &Artifact) -> Result<(), DeployError>;

    /// Stop an artifact without undeploying it.
    async fn stop(&self, artifact: &Artifact) -> Result<(), DeployError>;
}

/// Run `monitor` on its own task and require it to end in `expected`.
pub(crate) async fn confirm(
    monitor: DeploymentMonitor,
    prober: Arc<dyn Prober>,
    path: &MountPath,
    expected: MonitorEvent,
) -> Result<(), DeployError> {
    let monitor = monitor.expecting(expected);
    let timeout = monitor.timeout();
    tracing::debug!(
        "Waiting up to {} ms for {} to be {:?} at {}",
        timeout.as_millis(),
        path,
        expected,
        monitor.name()
    );

    let event = monitor
        .spawn(prober)
        .await
        .map_err(|e| DeployError::UnderlyingActionFailed(format!("monitor task failed: {}", e)))?;

    if event == expected {
        Ok(())
    } else {
        Err(DeployError::DeploymentTimedOut {
            path: path.clone(),
            expected,
            timeout,
        })
    }
}
