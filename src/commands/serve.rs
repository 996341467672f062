// ABOUTME: Serve command implementation.
// ABOUTME: Opens the deployment directory and runs the endpoint until Ctrl-C.

use std::sync::Arc;

use stevedore::config::Config;
use stevedore::endpoint;
use stevedore::error::Result;
use stevedore::host::{Host, WebappRuntime};
use stevedore::output::Output;
use stevedore::registry::ContextRegistry;

pub async fn serve(config: Config, output: Output) -> Result<()> {
    let registry = Arc::new(ContextRegistry::new());
    let host = Arc::new(Host::open(
        &config.deploy_dir,
        registry,
        Arc::new(WebappRuntime),
    )?);

    let listener = endpoint::bind(config.listen).await?;
    let addr = listener.local_addr()?;
    output.progress(&format!(
        "Serving {} on http://{} (Ctrl-C to stop)",
        host.deploy_dir().display(),
        addr
    ));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down deployment endpoint");
    };

    endpoint::serve(listener, host, shutdown).await?;
    output.success("Endpoint stopped");
    Ok(())
}
