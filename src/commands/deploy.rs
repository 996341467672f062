// ABOUTME: Deploy, undeploy and redeploy command implementation.
// ABOUTME: Drives a remote deployer against the configured endpoint, optionally confirmed by a monitor.

use std::path::{Path, PathBuf};

use crate::cli::MonitorArgs;
use stevedore::config::Config;
use stevedore::deployer::{Deployer, RemoteDeployer};
use stevedore::error::{Error, Result};
use stevedore::monitor::DeploymentMonitor;
use stevedore::output::Output;
use stevedore::probe::ProbeTarget;
use stevedore::types::{Artifact, MountPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Undeploy,
    Redeploy,
}

pub async fn deploy(
    config: Config,
    action: Action,
    artifact: Option<PathBuf>,
    path: Option<String>,
    monitor: MonitorArgs,
    mut output: Output,
) -> Result<()> {
    let mount_path = match (path.as_deref(), artifact.as_deref()) {
        (Some(path), _) => MountPath::new(path)?,
        (None, Some(artifact)) => mount_path_for(artifact)?,
        (None, None) => {
            return Err(Error::InvalidConfig(
                "a mount path or an artifact is required".to_string(),
            ));
        }
    };
    let artifact = match artifact {
        Some(location) => {
            if !location.exists() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("artifact not found: {}", location.display()),
                )));
            }
            Artifact::from_location(mount_path.clone(), location)
        }
        None => Artifact::from_bytes(mount_path.clone(), Vec::new()),
    };

    let deployer = RemoteDeployer::new(&config.remote_url())?;
    let monitor = build_monitor(&config, monitor)?;

    output.start_timer();
    output.progress(&format!(
        "{:?} {} via {} ({} deployer)",
        action,
        mount_path,
        deployer.endpoint(),
        deployer.kind()
    ));

    let result = match action {
        Action::Deploy => deployer.deploy(&artifact, monitor).await,
        Action::Undeploy => deployer.undeploy(&artifact, monitor).await,
        Action::Redeploy => deployer.redeploy(&artifact, monitor).await,
    };

    for warning in deployer.warnings() {
        output.warning(&warning);
    }
    result?;

    let verb = match action {
        Action::Deploy => "Deployed",
        Action::Undeploy => "Undeployed",
        Action::Redeploy => "Redeployed",
    };
    output.success(&format!("{} {}", verb, mount_path));
    Ok(())
}

fn build_monitor(config: &Config, args: MonitorArgs) -> Result<Option<DeploymentMonitor>> {
    let Some(url) = args.ping_url else {
        return Ok(None);
    };

    let mut target = ProbeTarget::parse(&url)?;
    if let Some(needle) = args.contains {
        target = target.containing(needle);
    }
    let mut monitor = config.monitor.monitor_for(target);
    if let Some(timeout) = args.timeout {
        monitor = monitor.with_timeout(timeout);
    }
    Ok(Some(monitor))
}

/// `/shop` for `build/shop.war` or `build/shop/`.
fn mount_path_for(artifact: &Path) -> Result<MountPath> {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".war").unwrap_or(&name);
    if stem.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "cannot derive a mount path from {}",
            artifact.display()
        )));
    }
    Ok(MountPath::new(&format!("/{}", stem))?)
}
