// ABOUTME: Remote deployer speaking the line-oriented /deploy and /undeploy protocol.
// ABOUTME: Byte artifacts are uploaded with PUT; on-disk ones are referenced with war=file:.

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{Method, StatusCode, Uri};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::client;
use crate::diagnostics::{Diagnostics, Warning};
use crate::endpoint::protocol::{self, Reply};
use crate::monitor::{DeploymentMonitor, MonitorEvent};
use crate::probe::{HttpProber, Prober};
use crate::types::{Artifact, ArtifactKind, ArtifactSource, MountPath};

use super::{DeployError, Deployer, DeployerKind, confirm};

/// Default bound on one request to the endpoint, upload included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Deploys to a server through its remote deployment endpoint.
pub struct RemoteDeployer {
    endpoint: Uri,
    request_timeout: Duration,
    prober: Arc<dyn Prober>,
    diagnostics: Mutex<Diagnostics>,
}

impl std::fmt::Debug for RemoteDeployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDeployer")
            .field("endpoint", &self.endpoint.to_string())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl RemoteDeployer {
    /// Target the endpoint at `url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(url: &str) -> Result<Self, DeployError> {
        let endpoint = url
            .trim()
            .trim_end_matches('/')
            .parse::<Uri>()
            .map_err(|e| DeployError::Validation(format!("invalid endpoint URL {}: {}", url, e)))?;
        match endpoint.scheme_str() {
            Some("http") => {}
            _ => {
                return Err(DeployError::Validation(format!(
                    "endpoint URL must be http://host[:port], got {}",
                    url
                )));
            }
        }
        if endpoint.host().is_none() {
            return Err(DeployError::Validation(format!(
                "endpoint URL has no host: {}",
                url
            )));
        }

        Ok(Self {
            endpoint,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            prober: Arc::new(HttpProber::new()),
            diagnostics: Mutex::new(Diagnostics::default()),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Non-fatal warnings relayed by the endpoint.
    pub fn warnings(&self) -> Vec<Warning> {
        self.diagnostics.lock().warnings().to_vec()
    }

    async fn call(
        &self,
        method: Method,
        path_and_query: String,
        body: Bytes,
        path: &MountPath,
    ) -> Result<String, DeployError> {
        tracing::debug!("{} {}{}", method, self.endpoint, path_and_query);
        let (status, reply) = tokio::time::timeout(
            self.request_timeout,
            client::exchange(&self.endpoint, method, &path_and_query, body),
        )
        .await
        .map_err(|_| {
            DeployError::UnderlyingActionFailed(format!(
                "no reply from {} within {} ms",
                self.endpoint,
                self.request_timeout.as_millis()
            ))
        })?
        .map_err(DeployError::UnderlyingActionFailed)?;

        classify_reply(path, status, &String::from_utf8_lossy(&reply))
    }

    async fn upload(&self, path: &MountPath, bytes: Bytes) -> Result<String, DeployError> {
        let query = format!("/deploy?path={}", urlencoding::encode(path.as_str()));
        self.call(Method::PUT, query, bytes, path).await
    }
}

#[async_trait]
impl Deployer for RemoteDeployer {
    fn kind(&self) -> DeployerKind {
        DeployerKind::Remote
    }

    async fn deploy(
        &self,
        artifact: &Artifact,
        monitor: Option<DeploymentMonitor>,
    ) -> Result<(), DeployError> {
        let path = artifact.mount_path();

        let message = match (artifact.source(), artifact.kind()) {
            (ArtifactSource::Bytes(bytes), _) => self.upload(path, bytes.clone()).await?,
            (ArtifactSource::Location(location), ArtifactKind::Archive) => {
                let bytes = tokio::fs::read(location).await.map_err(|e| {
                    DeployError::TransferFailed(format!(
                        "cannot read {}: {}",
                        location.display(),
                        e
                    ))
                })?;
                self.upload(path, Bytes::from(bytes)).await?
            }
            (ArtifactSource::Location(location), ArtifactKind::Exploded) => {
                let absolute = tokio::fs::canonicalize(location).await.map_err(|e| {
                    DeployError::TransferFailed(format!(
                        "cannot resolve {}: {}",
                        location.display(),
                        e
                    ))
                })?;
                let war = format!("file:{}", absolute.display());
                let query = format!(
                    "/deploy?path={}&war={}",
                    urlencoding::encode(path.as_str()),
                    urlencoding::encode(&war)
                );
                self.call(Method::GET, query, Bytes::new(), path).await?
            }
        };
        tracing::info!("{}", message);

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
        let query = format!("/undeploy?path={}", urlencoding::encode(path.as_str()));

        let message = self.call(Method::GET, query, Bytes::new(), path).await?;
        if protocol::is_partial_success(&message) {
            self.diagnostics.lock().warn(Warning::remote(message));
        } else {
            tracing::info!("{}", message);
        }

        match monitor {
            Some(monitor) => {
                confirm(monitor, self.prober.clone(), path, MonitorEvent::Undeployed).await
            }
            None => Ok(()),
        }
    }

    async fn start(&self, artifact: &Artifact) -> Result<(), DeployError> {
        Err(DeployError::UnderlyingActionFailed(format!(
            "cannot start {} remotely: the endpoint has no start command",
            artifact.mount_path()
        )))
    }

    async fn stop(&self, artifact: &Artifact) -> Result<(), DeployError> {
        Err(DeployError::UnderlyingActionFailed(format!(
            "cannot stop {} remotely: the endpoint has no stop command",
            artifact.mount_path()
        )))
    }
}

/// Map an endpoint reply onto the deploy error taxonomy.
///
/// `OK - ` replies yield their message. Bodies that are not protocol lines
/// are only trusted as validation failures when the endpoint answered 400.
pub(crate) fn classify_reply(
    path: &MountPath,
    status: StatusCode,
    body: &str,
) -> Result<String, DeployError> {
    match Reply::parse(body) {
        Some(Reply::Ok(message)) => Ok(message),
        Some(Reply::Error(message)) => Err(classify_error(path, message)),
        None if status == StatusCode::BAD_REQUEST => {
            Err(DeployError::Validation(body.trim().to_string()))
        }
        None => Err(DeployError::UnderlyingActionFailed(format!(
            "unexpected reply ({}): {}",
            status,
            body.trim()
        ))),
    }
}

fn classify_error(path: &MountPath, message: String) -> DeployError {
    let is = |prefix: &str| message.starts_with(prefix);

    if is(protocol::PATH_IN_USE) || is(protocol::ALREADY_DEPLOYED) {
        DeployError::PathInUse(path.clone())
    } else if is(protocol::NO_HANDLER) {
        DeployError::NotFound(path.clone())
    } else if is(protocol::PATH_NOT_SET)
        || is(protocol::PATH_MUST_START_WITH_SLASH)
        || is(protocol::PATH_NO_LEADING_SLASH)
        || is(protocol::UNDEPLOY_PATH_NO_LEADING_SLASH)
        || is(protocol::CANNOT_PARSE_URL)
        || is(protocol::INVALID_PATH)
        || is(protocol::WAR_NOT_SET)
        || is(protocol::INVALID_LOCATION)
    {
        DeployError::Validation(message)
    } else if is(protocol::START_FAILED) {
        DeployError::ActivationFailed(message)
    } else if is(protocol::TRANSFER_FAILED) {
        DeployError::TransferFailed(message)
    } else {
        DeployError::UnderlyingActionFailed(message)
    }
}
