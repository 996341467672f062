// ABOUTME: Validated domain types shared across deployers and the endpoint.
// ABOUTME: Mount paths and the artifacts deployed under them.

mod artifact;
mod mount_path;

pub use artifact::{Artifact, ArtifactKind, ArtifactSource};
pub use mount_path::{MountPath, MountPathError};
