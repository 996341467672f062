// ABOUTME: Installed deployer acting directly on a host's deployment directory.
// ABOUTME: Shares the host's registry, so path conflicts are detected in-process.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Warning};
use crate::host::Host;
use crate::monitor::{DeploymentMonitor, MonitorEvent};
use crate::probe::{HttpProber, Prober};
use crate::types::Artifact;

use super::{DeployError, Deployer, DeployerKind, confirm};

/// Deploys into a server running in this process.
pub struct LocalDeployer {
    host: Arc<Host>,
    prober: Arc<dyn Prober>,
    diagnostics: Mutex<Diagnostics>,
}

impl std::fmt::Debug for LocalDeployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDeployer")
            .field("host", &self.host)
            .finish()
    }
}

impl LocalDeployer {
    pub fn new(host: Arc<Host>) -> Self {
        Self::with_prober(host, Arc::new(HttpProber::new()))
    }

    /// Use a custom prober for monitors passed to this deployer.
    pub fn with_prober(host: Arc<Host>, prober: Arc<dyn Prober>) -> Self {
        Self {
            host,
            prober,
            diagnostics: Mutex::new(Diagnostics::default()),
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Non-fatal warnings collected so far.
    pub fn warnings(&self) -> Vec<Warning> {
        self.diagnostics.lock().warnings().to_vec()
    }
}

#[async_trait]
impl Deployer for LocalDeployer {
    fn kind(&self) -> DeployerKind {
        DeployerKind::Installed
    }

    async fn deploy(
        &self,
        artifact: &Artifact,
        monitor: Option<DeploymentMonitor>,
    ) -> Result<(), DeployError> {
        let path = artifact.mount_path();
        if self.host.registry().is_taken(path) {
            return Err(DeployError::PathInUse(path.clone()));
        }

        tracing::debug!("Deploying {:?} artifact at {}", artifact.kind(), path);
        self.host.deploy(artifact).await?;

        match monitor {
            Some(monitor) => {
                confirm(monitor, self.prober.clone(), path, MonitorEvent::Deployed).await
            }
            None => Ok(()),
        }
    }

    async fn undeploy(
        &self,
        artifact: &Artifact,
        monitor: Option<DeploymentMonitor>,
    ) -> Result<(), DeployError> {
        let path = artifact.mount_path();
        tracing::debug!("Undeploying {}", path);

        let outcome = self.host.undeploy(path).await?;
        if let Some(warning) = Warning::for_undeploy(path, &outcome) {
            self.diagnostics.lock().warn(warning);
        }

        match monitor {
            Some(monitor) => {
                confirm(monitor, self.prober.clone(), path, MonitorEvent::Undeployed).await
            }
            None => Ok(()),
        }
    }

    async fn start(&self, artifact: &Artifact) -> Result<(), DeployError> {
        self.host.start(artifact.mount_path()).await?;
        Ok(())
    }

    async fn stop(&self, artifact: &Artifact) -> Result<(), DeployError> {
        self.host.stop(artifact.mount_path()).await?;
        Ok(())
    }
}
