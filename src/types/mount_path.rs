// ABOUTME: Validated mount path under which a deployed artifact is routed.
// ABOUTME: Rejects traversal segments so a path can safely name a file in the deploy dir.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountPathError {
    #[error("The path variable is not set")]
    Empty,

    #[error("The path variable must start with /")]
    MissingLeadingSlash,

    #[error("The path must not contain empty segments")]
    EmptySegment,

    #[error("The path must not contain '.' or '..' segments")]
    Traversal,

    #[error("invalid character in path: {0:?}")]
    InvalidChar(char),
}

/// Routing prefix of a deployed artifact, e.g. `/` or `/shop`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountPath(String);

impl MountPath {
    pub fn new(value: &str) -> Result<Self, MountPathError> {
        if value.is_empty() {
            return Err(MountPathError::Empty);
        }

        if !value.starts_with('/') {
            return Err(MountPathError::MissingLeadingSlash);
        }

        if let Some(c) = value
            .chars()
            .find(|c| matches!(c, '\\' | '#' | '?') || c.is_control())
        {
            return Err(MountPathError::InvalidChar(c));
        }

        if value == "/" {
            return Ok(Self::root());
        }

        // A single trailing slash is tolerated and dropped: "/app/" == "/app".
        let trimmed = value.strip_suffix('/').unwrap_or(value);
        for segment in trimmed[1..].split('/') {
            match segment {
                "" => return Err(MountPathError::EmptySegment),
                "." | ".." => return Err(MountPathError::Traversal),
                _ => {}
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// File stem used for the artifact inside the deployment directory.
    ///
    /// The root context maps to `ROOT`; nested paths flatten with `#` so every
    /// artifact lives directly in the deployment directory.
    pub fn file_stem(&self) -> String {
        if self.is_root() {
            "ROOT".to_string()
        } else {
            self.0[1..].replace('/', "#")
        }
    }

    /// Whether a request path is served by this mount path.
    pub fn matches(&self, request_path: &str) -> bool {
        if self.is_root() {
            return request_path.starts_with('/');
        }
        match request_path.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for MountPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_root_and_nested_paths() {
        assert!(MountPath::new("/").unwrap().is_root());
        assert_eq!(MountPath::new("/shop").unwrap().as_str(), "/shop");
        assert_eq!(MountPath::new("/a/b").unwrap().as_str(), "/a/b");
    }

    #[test]
    fn drops_single_trailing_slash() {
        assert_eq!(MountPath::new("/shop/").unwrap().as_str(), "/shop");
    }

    #[test]
    fn rejects_relative_and_traversal() {
        assert_eq!(MountPath::new(""), Err(MountPathError::Empty));
        assert_eq!(
            MountPath::new("shop"),
            Err(MountPathError::MissingLeadingSlash)
        );
        assert_eq!(MountPath::new("/../etc"), Err(MountPathError::Traversal));
        assert_eq!(MountPath::new("/a//b"), Err(MountPathError::EmptySegment));
        assert_eq!(
            MountPath::new("/a\\b"),
            Err(MountPathError::InvalidChar('\\'))
        );
        // '#' is reserved for flattened file stems
        assert_eq!(
            MountPath::new("/a#b"),
            Err(MountPathError::InvalidChar('#'))
        );
    }

    #[test]
    fn file_stem_flattens_nested_paths() {
        assert_eq!(MountPath::root().file_stem(), "ROOT");
        assert_eq!(MountPath::new("/shop").unwrap().file_stem(), "shop");
        assert_eq!(MountPath::new("/a/b").unwrap().file_stem(), "a#b");
    }

    #[test]
    fn matches_on_segment_boundaries() {
        let shop = MountPath::new("/shop").unwrap();
        assert!(shop.matches("/shop"));
        assert!(shop.matches("/shop/cart"));
        assert!(!shop.matches("/shopping"));
        assert!(MountPath::root().matches("/anything"));
    }
}
