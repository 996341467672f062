// ABOUTME: Server-side deployment actions over the deployment directory and registry.
// ABOUTME: Used in-process by the local deployer and over the network by the endpoint.

mod error;
mod runtime;

pub use error::HostError;
pub use runtime::{ContextRuntime, ContextRuntimeError, WebappRuntime};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::files;
use crate::registry::{ContextRegistry, DeployedContext, Reservation};
use crate::types::{Artifact, ArtifactKind, ArtifactSource, MountPath};

/// What happened to the on-disk artifact when its context was undeployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndeployOutcome {
    /// The artifact was inside the deployment directory and was deleted.
    Removed(PathBuf),
    /// The artifact lies outside the deployment directory and was left alone.
    Retained(PathBuf),
    /// No file was found at the recorded location.
    Missing(PathBuf),
    /// Deletion was attempted and failed.
    RemovalFailed { location: PathBuf, reason: String },
}

impl UndeployOutcome {
    /// Warning to surface when the artifact could not be cleaned up.
    pub fn warning(&self) -> Option<String> {
        match self {
            UndeployOutcome::Removed(_) => None,
            UndeployOutcome::Retained(location) => Some(format!(
                "{} is outside the deployment directory and was not removed",
                location.display()
            )),
            UndeployOutcome::Missing(location) => {
                Some(format!("no artifact found at {}", location.display()))
            }
            UndeployOutcome::RemovalFailed { location, reason } => Some(format!(
                "failed to remove {}: {}",
                location.display(),
                reason
            )),
        }
    }
}

/// A running server's deployment area.
///
/// Owns the managed deployment directory and shares the registry with every
/// component that deploys into this server.
pub struct Host {
    deploy_dir: PathBuf,
    registry: Arc<ContextRegistry>,
    runtime: Arc<dyn ContextRuntime>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("deploy_dir", &self.deploy_dir)
            .field("contexts", &self.registry.len())
            .finish()
    }
}

impl Host {
    /// Open (creating if needed) the deployment directory.
    pub fn open(
        deploy_dir: &Path,
        registry: Arc<ContextRegistry>,
        runtime: Arc<dyn ContextRuntime>,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(deploy_dir)?;
        Ok(Self {
            deploy_dir: deploy_dir.canonicalize()?,
            registry,
            runtime,
        })
    }

    pub fn deploy_dir(&self) -> &Path {
        &self.deploy_dir
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Where an artifact for `path` is placed inside the deployment directory.
    pub fn location_for(&self, path: &MountPath, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::Archive => self.deploy_dir.join(format!("{}.war", path.file_stem())),
            ArtifactKind::Exploded => self.deploy_dir.join(path.file_stem()),
        }
    }

    /// Place and start an artifact, whatever its source.
    pub async fn deploy(&self, artifact: &Artifact) -> Result<Arc<DeployedContext>, HostError> {
        match artifact.source() {
            ArtifactSource::Bytes(bytes) => {
                self.deploy_bytes(artifact.mount_path(), bytes.clone()).await
            }
            ArtifactSource::Location(source) => self.deploy_from(artifact.mount_path(), source).await,
        }
    }

    pub async fn deploy_bytes(
        &self,
        path: &MountPath,
        bytes: Bytes,
    ) -> Result<Arc<DeployedContext>, HostError> {
        let body = futures::stream::once(async move { Ok::<_, std::convert::Infallible>(bytes) });
        self.deploy_stream(path, body).await
    }

    /// Stream an uploaded archive to its final location, then start it.
    ///
    /// The path is reserved before the first byte is written. Bytes go
    /// straight to the final file, so a failed transfer leaves a partial
    /// archive there; it is reported, not cleaned up.
    pub async fn deploy_stream<S, E>(
        &self,
        path: &MountPath,
        body: S,
    ) -> Result<Arc<DeployedContext>, HostError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display,
    {
        let reservation = self.registry.reserve(path)?;
        let location = self.location_for(path, ArtifactKind::Archive);
        tracing::debug!("Receiving archive for {} into {}", path, location.display());

        let written = write_stream(&location, body).await.map_err(|reason| {
            tracing::warn!("Transfer to {} failed: {}", location.display(), reason);
            HostError::TransferFailed {
                location: location.clone(),
                reason,
            }
        })?;
        tracing::debug!("Wrote {} bytes to {}", written, location.display());

        self.activate(reservation, location).await
    }

    /// Copy an artifact from a location readable by this server, then start it.
    ///
    /// A source that already is the deployment location is started in place.
    /// A source that contains, or lies inside, the deployment location is
    /// rejected, since copying would read from what it overwrites.
    pub async fn deploy_from(
        &self,
        path: &MountPath,
        source: &Path,
    ) -> Result<Arc<DeployedContext>, HostError> {
        let reservation = self.registry.reserve(path)?;
        let kind = if source.is_dir() {
            ArtifactKind::Exploded
        } else {
            ArtifactKind::Archive
        };
        let location = self.location_for(path, kind);

        let canonical_source = source.canonicalize().map_err(|e| HostError::TransferFailed {
            location: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        if location.canonicalize().is_ok_and(|existing| existing == canonical_source) {
            tracing::debug!(
                "{} is already in place for {}; starting it without copying",
                source.display(),
                path
            );
            return self.activate(reservation, location).await;
        }
        if location.starts_with(&canonical_source) || canonical_source.starts_with(&location) {
            return Err(HostError::Validation(format!(
                "{} overlaps the deployment location {}",
                source.display(),
                location.display()
            )));
        }

        tracing::debug!(
            "Copying {} for {} into {}",
            source.display(),
            path,
            location.display()
        );

        let (from, to) = (source.to_path_buf(), location.clone());
        let copied = tokio::task::spawn_blocking(move || {
            if kind == ArtifactKind::Exploded && files::exists(&to) {
                files::remove_tree(&to)?;
            }
            files::copy_artifact(&from, &to)
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|r| r.map_err(|e| e.to_string()))
        .map_err(|reason| HostError::TransferFailed {
            location: location.clone(),
            reason,
        })?;
        tracing::debug!("Copied {} bytes to {}", copied, location.display());

        self.activate(reservation, location).await
    }

    async fn activate(
        &self,
        reservation: Reservation<'_>,
        location: PathBuf,
    ) -> Result<Arc<DeployedContext>, HostError> {
        let path = reservation.path().clone();
        let context = DeployedContext::new(path.clone(), location);

        if let Err(e) = self.runtime.start(&context).await {
            tracing::warn!(
                "Could not start {}; artifact left at {}: {}",
                path,
                context.location().display(),
                e
            );
            return Err(HostError::ActivationFailed {
                path,
                reason: e.to_string(),
            });
        }
        context.set_running(true);

        let context = reservation.commit(context);
        tracing::info!(
            "Deployed {} from {} at {}",
            context.mount_path(),
            context.location().display(),
            context.deployed_at().to_rfc3339()
        );
        Ok(context)
    }

    /// Stop the context, unregister it, then delete its artifact if it is
    /// strictly inside the deployment directory. The mount path is released
    /// only after the deletion outcome is known.
    pub async fn undeploy(&self, path: &MountPath) -> Result<UndeployOutcome, HostError> {
        let context = self
            .registry
            .lookup(path)
            .ok_or_else(|| HostError::NotFound(path.clone()))?;

        self.runtime
            .stop(&context)
            .await
            .map_err(|e| HostError::StopFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        context.set_running(false);
        // The path stays held until the artifact is dealt with, so a new
        // deployment cannot write where the old one is being deleted.
        let (context, hold) = self.registry.retire(path)?;

        let location = context.location().to_path_buf();
        let outcome = if !files::exists(&location) {
            UndeployOutcome::Missing(location)
        } else if !files::is_contained(&self.deploy_dir, &location) {
            UndeployOutcome::Retained(location)
        } else {
            let target = location.clone();
            match tokio::task::spawn_blocking(move || files::remove_tree(&target)).await {
                Ok(Ok(())) => UndeployOutcome::Removed(location),
                Ok(Err(e)) => UndeployOutcome::RemovalFailed {
                    location,
                    reason: e.to_string(),
                },
                Err(e) => UndeployOutcome::RemovalFailed {
                    location,
                    reason: e.to_string(),
                },
            }
        };

        drop(hold);

        match outcome.warning() {
            Some(warning) => tracing::warn!("Undeployed {}: {}", path, warning),
            None => tracing::info!("Undeployed {}", path),
        }
        Ok(outcome)
    }

    /// Start an already-deployed context. Starting a running context is a no-op.
    pub async fn start(&self, path: &MountPath) -> Result<(), HostError> {
        let context = self
            .registry
            .lookup(path)
            .ok_or_else(|| HostError::NotFound(path.clone()))?;
        if context.is_running() {
            return Ok(());
        }
        self.runtime
            .start(&context)
            .await
            .map_err(|e| HostError::ActivationFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        context.set_running(true);
        tracing::info!("Started {}", path);
        Ok(())
    }

    /// Stop a context without unregistering it.
    pub async fn stop(&self, path: &MountPath) -> Result<(), HostError> {
        let context = self
            .registry
            .lookup(path)
            .ok_or_else(|| HostError::NotFound(path.clone()))?;
        if !context.is_running() {
            return Ok(());
        }
        self.runtime
            .stop(&context)
            .await
            .map_err(|e| HostError::StopFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        context.set_running(false);
        tracing::info!("Stopped {}", path);
        Ok(())
    }
}

async fn write_stream<S, E>(location: &Path, body: S) -> Result<u64, String>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let file = tokio::fs::File::create(location)
        .await
        .map_err(|e| e.to_string())?;
    let mut writer = tokio::io::BufWriter::new(file);
    let mut written = 0u64;

    let mut body = std::pin::pin!(body);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| format!("failed to read upload: {}", e))?;
        writer.write_all(&chunk).await.map_err(|e| e.to_string())?;
        written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| e.to_string())?;
    writer
        .get_ref()
        .sync_all()
        .await
        .map_err(|e| e.to_string())?;
    Ok(written)
}
