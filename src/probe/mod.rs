// ABOUTME: Single-shot network probe against a deployed artifact's URL.
// ABOUTME: Failures are data (ProbeResult), never errors, so callers can keep polling.

mod http;

pub use http::HttpProber;

use async_trait::async_trait;
use hyper::Uri;
use std::fmt;
use std::time::Duration;

/// Errors building a probe target.
#[derive(Debug, thiserror::Error)]
pub enum ProbeTargetError {
    #[error("probe address cannot be empty")]
    Empty,

    #[error("invalid probe address {address}: {reason}")]
    Invalid { address: String, reason: String },
}

/// The URL to ping, plus an optional string its response body must contain.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    address: Uri,
    contains: Option<String>,
}

impl ProbeTarget {
    pub fn parse(address: &str) -> Result<Self, ProbeTargetError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ProbeTargetError::Empty);
        }
        let uri = address
            .parse::<Uri>()
            .map_err(|e| ProbeTargetError::Invalid {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        if uri.host().is_none() {
            return Err(ProbeTargetError::Invalid {
                address: address.to_string(),
                reason: "missing host".to_string(),
            });
        }
        Ok(Self {
            address: uri,
            contains: None,
        })
    }

    /// Require the response body to contain `needle` for the target to count as up.
    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.contains = Some(needle.into());
        self
    }

    pub fn address(&self) -> &Uri {
        &self.address
    }

    pub fn contains(&self) -> Option<&str> {
        self.contains.as_deref()
    }

    /// Whether a probe result satisfies this target.
    ///
    /// The substring check is skipped when no needle is configured; when one
    /// is configured a missing body never matches.
    pub fn is_satisfied_by(&self, result: &ProbeResult) -> bool {
        if !result.success {
            return false;
        }
        match (&self.contains, &result.body) {
            (None, _) => true,
            (Some(needle), Some(body)) => body.contains(needle.as_str()),
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Outcome of one probe round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub success: bool,
    /// HTTP status, or 0 when no response was received.
    pub status_code: u16,
    pub status_message: String,
    pub body: Option<String>,
}

impl ProbeResult {
    /// A probe that never got an HTTP response (refused, DNS, timeout...).
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: 0,
            status_message: message.into(),
            body: None,
        }
    }
}

/// Performs exactly one network check. Implementations must not retry.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &ProbeTarget, timeout: Duration) -> ProbeResult;
}
