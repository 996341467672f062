// ABOUTME: Configuration types and parsing for stevedore.yml.
// ABOUTME: Handles YAML parsing, duration defaults, and config file discovery.

mod deserialize;
mod init;

pub use init::init_config;

use crate::error::{Error, Result};
use crate::monitor::{self, DeploymentMonitor};
use crate::probe::ProbeTarget;
use deserialize::{deserialize_deploy_dir, deserialize_endpoint_url};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "stevedore.yml";
pub const CONFIG_FILENAME_ALT: &str = "stevedore.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stevedore/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Managed deployment directory. Relative paths resolve against the
    /// directory holding the config file.
    #[serde(deserialize_with = "deserialize_deploy_dir")]
    pub deploy_dir: PathBuf,

    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            timeout: default_monitor_timeout(),
            poll_interval: default_poll_interval(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

impl MonitorConfig {
    /// A monitor for `target` using these settings.
    pub fn monitor_for(&self, target: ProbeTarget) -> DeploymentMonitor {
        DeploymentMonitor::new(target)
            .with_timeout(self.timeout)
            .with_poll_interval(self.poll_interval)
            .with_probe_timeout(self.probe_timeout)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(deserialize_with = "deserialize_endpoint_url")]
    pub url: String,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_monitor_timeout() -> Duration {
    monitor::DEFAULT_TIMEOUT
}

fn default_poll_interval() -> Duration {
    monitor::DEFAULT_POLL_INTERVAL
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    /// Load a config file, resolving a relative `deploy_dir` against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if config.deploy_dir.is_relative() {
            let base = config_root(path);
            config.deploy_dir = base.join(&config.deploy_dir);
        }
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Using configuration {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Endpoint a remote deployer talks to: `remote.url`, else the local listener.
    pub fn remote_url(&self) -> String {
        match &self.remote {
            Some(remote) => remote.url.clone(),
            None => format!("http://{}", self.listen),
        }
    }

    pub fn template() -> Self {
        Config {
            deploy_dir: PathBuf::from("webapps"),
            listen: default_listen(),
            monitor: MonitorConfig::default(),
            remote: None,
        }
    }
}

/// Directory a config file's relative paths are anchored to. Files inside
/// `.stevedore/` belong to the project directory above it.
fn config_root(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if parent.file_name().is_some_and(|name| name == ".stevedore") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}
