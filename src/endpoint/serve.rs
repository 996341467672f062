// ABOUTME: Binds and runs the deployment endpoint until shutdown is signalled.
// ABOUTME: Server-level failures use the SNAFU pattern with a programmatic kind.

use snafu::{ResultExt, Snafu};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::host::Host;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ServeError {
    #[snafu(display("failed to bind {addr}: {source}"))]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[snafu(display("endpoint stopped unexpectedly: {source}"))]
    Server { source: std::io::Error },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeErrorKind {
    /// The listen address is unavailable.
    AddressUnavailable,
    /// The accept loop failed after startup.
    ServerFailed,
}

impl ServeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ServeErrorKind {
        match self {
            ServeError::Bind { .. } => ServeErrorKind::AddressUnavailable,
            ServeError::Server { .. } => ServeErrorKind::ServerFailed,
        }
    }
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr).await.context(BindSnafu { addr })
}

/// Serve the endpoint on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    host: Arc<Host>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            "Deployment endpoint listening on {} (deploy dir {})",
            addr,
            host.deploy_dir().display()
        );
    }

    axum::serve(listener, super::router(host))
        .with_graceful_shutdown(shutdown)
        .await
        .context(ServerSnafu)
}
