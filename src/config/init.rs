// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates stevedore.yml template files.

use humantime_serde::re::humantime::format_duration;
use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, deploy_dir: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(d) = deploy_dir {
        if d.trim().is_empty() {
            return Err(Error::InvalidConfig("deploy_dir cannot be empty".to_string()));
        }
        config.deploy_dir = d.into();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"deploy_dir: {}
listen: {}
monitor:
  timeout: {}
  poll_interval: {}
  probe_timeout: {}
# Endpoint used by deploy/undeploy/redeploy (default: http://<listen>)
# remote:
#   url: http://server.example.com:8080
"#,
        config.deploy_dir.display(),
        config.listen,
        format_duration(config.monitor.timeout),
        format_duration(config.monitor.poll_interval),
        format_duration(config.monitor.probe_timeout),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_durations_use_humantime_notation() {
        let yaml = generate_template_yaml(&Config::template());

        assert!(yaml.contains("timeout: 20s\n"), "{}", yaml);
        assert!(yaml.contains("poll_interval: 100ms\n"), "{}", yaml);
        assert!(yaml.contains("probe_timeout: 5s\n"), "{}", yaml);
    }
}
