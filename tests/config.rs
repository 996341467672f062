// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, defaults, discovery, and init scaffolding.

use std::fs;
use std::time::Duration;
use stevedore::config::*;
use stevedore::error::Error;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_yaml("deploy_dir: /srv/webapps\n").unwrap();

        assert_eq!(config.deploy_dir.to_str(), Some("/srv/webapps"));
        assert_eq!(config.listen.to_string(), "127.0.0.1:8080");
        assert_eq!(config.monitor.timeout, Duration::from_secs(20));
        assert_eq!(config.monitor.poll_interval, Duration::from_millis(100));
        assert_eq!(config.monitor.probe_timeout, Duration::from_secs(5));
        assert!(config.remote.is_none());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
deploy_dir: ./webapps
listen: 0.0.0.0:9090
monitor:
  timeout: 1m
  poll_interval: 250ms
  probe_timeout: 2s
remote:
  url: http://app.example.com:9090
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.listen.port(), 9090);
        assert_eq!(config.monitor.timeout, Duration::from_secs(60));
        assert_eq!(config.monitor.poll_interval, Duration::from_millis(250));
        assert_eq!(config.monitor.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.remote_url(), "http://app.example.com:9090");
    }

    #[test]
    fn partial_monitor_section_keeps_other_defaults() {
        let yaml = r#"
deploy_dir: webapps
monitor:
  timeout: 5s
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.monitor.timeout, Duration::from_secs(5));
        assert_eq!(config.monitor.poll_interval, Duration::from_millis(100));
    }
}

mod validation {
    use super::*;

    #[test]
    fn missing_deploy_dir_is_rejected() {
        let err = Config::from_yaml("listen: 127.0.0.1:8080\n").unwrap_err();
        assert!(err.to_string().contains("deploy_dir"));
    }

    #[test]
    fn empty_deploy_dir_is_rejected() {
        let err = Config::from_yaml("deploy_dir: \"\"\n").unwrap_err();
        assert!(err.to_string().contains("deploy_dir cannot be empty"));
    }

    #[test]
    fn remote_url_must_be_http() {
        let yaml = r#"
deploy_dir: webapps
remote:
  url: https://app.example.com
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("http://host"));
    }

    #[test]
    fn bad_duration_is_rejected() {
        let yaml = r#"
deploy_dir: webapps
monitor:
  timeout: soon
"#;
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Yaml(_))));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discovers_primary_file_and_resolves_relative_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "deploy_dir: webapps\n").unwrap();

        let config = Config::discover(tmp.path()).unwrap();

        assert_eq!(config.deploy_dir, tmp.path().join("webapps"));
    }

    #[test]
    fn discovers_config_in_dot_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(".stevedore")).unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME_DIR), "deploy_dir: webapps\n").unwrap();

        let config = Config::discover(tmp.path()).unwrap();

        assert_eq!(config.deploy_dir, tmp.path().join("webapps"));
    }

    #[test]
    fn absolute_deploy_dir_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME_ALT), "deploy_dir: /srv/webapps\n").unwrap();

        let config = Config::discover(tmp.path()).unwrap();

        assert_eq!(config.deploy_dir.to_str(), Some("/srv/webapps"));
    }

    #[test]
    fn missing_config_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(tmp.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }
}

mod init {
    use super::*;

    #[test]
    fn template_round_trips_through_the_parser() {
        let tmp = tempfile::tempdir().unwrap();
        init_config(tmp.path(), Some("/srv/webapps"), false).unwrap();

        let config = Config::discover(tmp.path()).unwrap();

        assert_eq!(config.deploy_dir.to_str(), Some("/srv/webapps"));
        assert_eq!(config.monitor.timeout, Duration::from_secs(20));
        assert_eq!(config.monitor.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        init_config(tmp.path(), None, false).unwrap();

        assert!(matches!(
            init_config(tmp.path(), None, false),
            Err(Error::AlreadyExists(_))
        ));
        assert!(init_config(tmp.path(), None, true).is_ok());
    }
}
