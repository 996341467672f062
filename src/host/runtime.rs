// ABOUTME: Runtime hook that starts and stops a deployed context's handler.
// ABOUTME: WebappRuntime validates archives and exploded directories before serving them.

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncReadExt;

use crate::registry::DeployedContext;

/// Errors from a context runtime.
#[derive(Debug, thiserror::Error)]
pub enum ContextRuntimeError {
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Starts and stops the handler behind a deployed context.
///
/// The host flips the context's running flag only after these calls succeed.
#[async_trait]
pub trait ContextRuntime: Send + Sync {
    async fn start(&self, context: &DeployedContext) -> Result<(), ContextRuntimeError>;

    async fn stop(&self, context: &DeployedContext) -> Result<(), ContextRuntimeError>;
}

/// Zip local-file and end-of-central-directory signatures.
const ZIP_SIGNATURES: [[u8; 4]; 2] = [*b"PK\x03\x04", *b"PK\x05\x06"];

/// Serves web application archives and exploded directories as-is.
///
/// Starting checks that the artifact is a readable zip archive or a
/// directory, which catches truncated or corrupt uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebappRuntime;

#[async_trait]
impl ContextRuntime for WebappRuntime {
    async fn start(&self, context: &DeployedContext) -> Result<(), ContextRuntimeError> {
        let location = context.location();
        let meta = tokio::fs::metadata(location).await?;
        if meta.is_dir() {
            return Ok(());
        }

        let mut header = [0u8; 4];
        let mut file = tokio::fs::File::open(location).await?;
        let read = file.read(&mut header).await?;
        if read < header.len() || !ZIP_SIGNATURES.contains(&header) {
            return Err(ContextRuntimeError::InvalidArtifact(format!(
                "{} is not a web archive",
                location.display()
            )));
        }
        Ok(())
    }

    async fn stop(&self, _context: &DeployedContext) -> Result<(), ContextRuntimeError> {
        Ok(())
    }
}
