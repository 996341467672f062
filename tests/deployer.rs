// ABOUTME: End-to-end tests of the deployers against a live endpoint.
// ABOUTME: Deploys over HTTP and confirms with monitors probing the served contexts.

mod support;

use std::fs;
use std::time::Duration;
use stevedore::deployer::{DeployErrorKind, Deployer, LocalDeployer, RemoteDeployer};
use stevedore::diagnostics::WarningKind;
use stevedore::monitor::{DeploymentMonitor, MonitorEvent};
use stevedore::probe::ProbeTarget;
use stevedore::registry::DeployedContext;
use stevedore::types::{Artifact, MountPath};
use support::{WAR, init_tracing, open_host, spawn_endpoint};

fn path(p: &str) -> MountPath {
    MountPath::new(p).unwrap()
}

fn monitor(addr: std::net::SocketAddr, context: &str) -> DeploymentMonitor {
    DeploymentMonitor::new(ProbeTarget::parse(&format!("http://{}{}", addr, context)).unwrap())
        .with_timeout(Duration::from_secs(5))
        .with_poll_interval(Duration::from_millis(20))
}

mod remote {
    use super::*;

    #[tokio::test]
    async fn deploy_is_confirmed_by_probing_the_context() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();

        let probe = monitor(addr, "/shop");
        deployer
            .deploy(&Artifact::from_bytes(path("/shop"), WAR), Some(probe))
            .await
            .unwrap();

        assert!(host.registry().lookup(&path("/shop")).is_some());
        assert!(host.deploy_dir().join("shop.war").is_file());
    }

    #[tokio::test]
    async fn undeploy_is_confirmed_when_context_goes_away() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();
        let artifact = Artifact::from_bytes(path("/shop"), WAR);
        deployer.deploy(&artifact, None).await.unwrap();

        deployer
            .undeploy(&artifact, Some(monitor(addr, "/shop")))
            .await
            .unwrap();

        assert!(host.registry().is_empty());
        assert!(deployer.warnings().is_empty());
    }

    #[tokio::test]
    async fn content_mismatch_times_out_but_deployment_stays() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();

        let target = ProbeTarget::parse(&format!("http://{}/shop", addr))
            .unwrap()
            .containing("Welcome to the shop");
        let probe = DeploymentMonitor::new(target)
            .with_timeout(Duration::from_millis(300))
            .with_poll_interval(Duration::from_millis(20));

        let err = deployer
            .deploy(&Artifact::from_bytes(path("/shop"), WAR), Some(probe))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::DeploymentTimedOut);
        assert!(host.registry().lookup(&path("/shop")).is_some());
    }

    #[tokio::test]
    async fn archive_and_exploded_locations_are_deployed() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();

        let war = tmp.path().join("catalog.war");
        fs::write(&war, WAR).unwrap();
        deployer
            .deploy(&Artifact::from_location(path("/catalog"), &war), None)
            .await
            .unwrap();

        let exploded = tmp.path().join("build/site");
        fs::create_dir_all(&exploded).unwrap();
        fs::write(exploded.join("index.html"), "hello").unwrap();
        deployer
            .deploy(&Artifact::from_location(path("/site"), &exploded), None)
            .await
            .unwrap();

        assert!(host.deploy_dir().join("catalog.war").is_file());
        assert!(host.deploy_dir().join("site/index.html").is_file());
        assert_eq!(host.registry().len(), 2);
    }

    #[tokio::test]
    async fn protocol_errors_keep_their_kind() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();
        let artifact = Artifact::from_bytes(path("/shop"), WAR);
        deployer.deploy(&artifact, None).await.unwrap();

        let in_use = deployer.deploy(&artifact, None).await.unwrap_err();
        assert_eq!(in_use.kind(), DeployErrorKind::PathInUse);

        let missing = deployer
            .undeploy(&Artifact::from_bytes(path("/nothing"), WAR), None)
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), DeployErrorKind::NotFound);

        let broken = deployer
            .deploy(&Artifact::from_bytes(path("/broken"), &b"garbage"[..]), None)
            .await
            .unwrap_err();
        assert_eq!(broken.kind(), DeployErrorKind::ActivationFailed);
    }

    #[tokio::test]
    async fn retained_artifact_is_relayed_as_warning() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let outside = tmp.path().join("legacy.war");
        fs::write(&outside, WAR).unwrap();
        host.registry()
            .insert(DeployedContext::new(path("/legacy"), &outside))
            .unwrap();
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();

        deployer
            .undeploy(&Artifact::from_location(path("/legacy"), &outside), None)
            .await
            .unwrap();

        let warnings = deployer.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::Remote);
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn redeploy_round_trip_leaves_one_entry_and_one_file() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();
        let artifact = Artifact::from_bytes(path("/shop"), WAR);

        deployer.deploy(&artifact, None).await.unwrap();
        deployer
            .redeploy(&artifact, Some(monitor(addr, "/shop")))
            .await
            .unwrap();

        assert_eq!(host.registry().len(), 1);
        assert_eq!(fs::read_dir(host.deploy_dir()).unwrap().count(), 1);
    }
}

mod local {
    use super::*;

    #[tokio::test]
    async fn local_deploy_is_visible_to_the_endpoint() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = LocalDeployer::new(host.clone());

        deployer
            .deploy(
                &Artifact::from_bytes(path("/app"), WAR),
                Some(monitor(addr, "/app")),
            )
            .await
            .unwrap();

        let remote = RemoteDeployer::new(&format!("http://{}", addr)).unwrap();
        let err = remote
            .deploy(&Artifact::from_bytes(path("/app"), WAR), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DeployErrorKind::PathInUse);
    }

    #[tokio::test]
    async fn stop_makes_the_context_unavailable() {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let host = open_host(&tmp.path().join("webapps"));
        let addr = spawn_endpoint(host.clone()).await;
        let deployer = LocalDeployer::new(host.clone());
        let artifact = Artifact::from_bytes(path("/app"), WAR);
        deployer.deploy(&artifact, None).await.unwrap();

        deployer.stop(&artifact).await.unwrap();

        let event = monitor(addr, "/app")
            .with_timeout(Duration::from_millis(200))
            .run(&stevedore::probe::HttpProber::new())
            .await;
        assert_eq!(event, MonitorEvent::Undeployed);
    }
}
