// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects artifact cleanup problems that shouldn't fail an undeploy.

use crate::host::UndeployOutcome;
use crate::types::MountPath;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Warning for an undeploy whose artifact could not be cleaned up, if any.
    pub fn for_undeploy(path: &MountPath, outcome: &UndeployOutcome) -> Option<Self> {
        let kind = match outcome {
            UndeployOutcome::Removed(_) => return None,
            UndeployOutcome::Retained(_) => WarningKind::ArtifactRetained,
            UndeployOutcome::Missing(_) => WarningKind::ArtifactMissing,
            UndeployOutcome::RemovalFailed { .. } => WarningKind::ArtifactRemovalFailed,
        };
        let detail = outcome.warning()?;
        Some(Self {
            kind,
            message: format!("undeployed {}, but {}", path, detail),
        })
    }

    /// Warning relayed verbatim from a remote server.
    pub fn remote(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Remote,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Artifact lies outside the deployment directory and was left on disk.
    ArtifactRetained,
    /// No artifact was found where the context said it lived.
    ArtifactMissing,
    /// Deleting the artifact failed.
    ArtifactRemovalFailed,
    /// A remote endpoint undeployed but reported it kept the artifact.
    Remote,
}
