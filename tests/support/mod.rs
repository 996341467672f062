// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and an in-process deployment endpoint.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Once};

use stevedore::host::{Host, WebappRuntime};
use stevedore::registry::ContextRegistry;

static TRACING_INIT: Once = Once::new();

/// Bytes that pass the archive check of the web application runtime.
#[allow(dead_code)]
pub const WAR: &[u8] = b"PK\x03\x04integration test archive";

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("stevedore=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A host over a fresh registry rooted at `dir`.
#[allow(dead_code)]
pub fn open_host(dir: &Path) -> Arc<Host> {
    Arc::new(
        Host::open(
            dir,
            Arc::new(ContextRegistry::new()),
            Arc::new(WebappRuntime),
        )
        .unwrap(),
    )
}

/// Serve the endpoint for `host` on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_endpoint(host: Arc<Host>) -> SocketAddr {
    let listener = stevedore::endpoint::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        stevedore::endpoint::serve(listener, host, std::future::pending())
            .await
            .unwrap();
    });
    addr
}
