// ABOUTME: Deployable artifact handed to a deployer for one operation.
// ABOUTME: Carries the mount path plus either in-memory bytes or an on-disk location.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::mount_path::MountPath;

/// Packaging of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A single archive file (e.g. a `.war`).
    Archive,
    /// An unpacked directory tree.
    Exploded,
}

/// Where the artifact's content comes from.
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    Bytes(Bytes),
    Location(PathBuf),
}

/// An immutable deployable application bundle.
#[derive(Debug, Clone)]
pub struct Artifact {
    mount_path: MountPath,
    source: ArtifactSource,
    kind: ArtifactKind,
}

impl Artifact {
    /// An archive held in memory.
    pub fn from_bytes(mount_path: MountPath, bytes: impl Into<Bytes>) -> Self {
        Self {
            mount_path,
            source: ArtifactSource::Bytes(bytes.into()),
            kind: ArtifactKind::Archive,
        }
    }

    /// An artifact on disk. Directories are treated as exploded artifacts.
    pub fn from_location(mount_path: MountPath, location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let kind = if location.is_dir() {
            ArtifactKind::Exploded
        } else {
            ArtifactKind::Archive
        };
        Self {
            mount_path,
            source: ArtifactSource::Location(location),
            kind,
        }
    }

    pub fn mount_path(&self) -> &MountPath {
        &self.mount_path
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// On-disk location, if the artifact is not held in memory.
    pub fn location(&self) -> Option<&Path> {
        match &self.source {
            ArtifactSource::Location(path) => Some(path),
            ArtifactSource::Bytes(_) => None,
        }
    }
}
