// ABOUTME: HTTP/1.1 prober built on the crate's raw hyper client exchange.
// ABOUTME: One GET per call, bounded by the caller's timeout, no retries.

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{Method, Uri};
use std::time::Duration;

use super::{ProbeResult, ProbeTarget, Prober};
use crate::client;

/// Pings a target over plain HTTP.
///
/// Any status below 400 counts as responding, matching how servlet
/// containers answer a freshly deployed context with redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProber;

impl HttpProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &ProbeTarget, timeout: Duration) -> ProbeResult {
        match tokio::time::timeout(timeout, ping(target.address())).await {
            Ok(Ok(result)) => result,
            Ok(Err(reason)) => ProbeResult::unreachable(reason),
            Err(_elapsed) => {
                ProbeResult::unreachable(format!("timed out after {} ms", timeout.as_millis()))
            }
        }
    }
}

async fn ping(uri: &Uri) -> Result<ProbeResult, String> {
    match uri.scheme_str() {
        None | Some("http") => {}
        Some(other) => return Err(format!("unsupported scheme: {}", other)),
    }

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let (status, body) = client::exchange(uri, Method::GET, path, Bytes::new()).await?;

    Ok(ProbeResult {
        success: status.as_u16() < 400,
        status_code: status.as_u16(),
        status_message: status.canonical_reason().unwrap_or_default().to_string(),
        body: Some(String::from_utf8_lossy(&body).into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn spawn_app(app: Router) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn responding_target_reports_status_and_body() {
        let addr = spawn_app(Router::new().route("/app", get(|| async { "hello app" }))).await;
        let target = ProbeTarget::parse(&format!("http://{}/app", addr)).unwrap();

        let result = HttpProber::new()
            .probe(&target, Duration::from_secs(5))
            .await;

        assert!(result.success);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body.as_deref(), Some("hello app"));
    }

    #[tokio::test]
    async fn error_status_is_not_success() {
        let addr = spawn_app(Router::new().route(
            "/app",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        ))
        .await;
        let target = ProbeTarget::parse(&format!("http://{}/app", addr)).unwrap();

        let result = HttpProber::new()
            .probe(&target, Duration::from_secs(5))
            .await;

        assert!(!result.success);
        assert_eq!(result.status_code, 503);
    }

    #[tokio::test]
    async fn refused_connection_is_a_failed_result() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let target = ProbeTarget::parse(&format!("http://{}/app", addr)).unwrap();

        let result = HttpProber::new()
            .probe(&target, Duration::from_secs(5))
            .await;

        assert!(!result.success);
        assert_eq!(result.status_code, 0);
        assert!(result.status_message.contains("failed"));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without ever answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let target = ProbeTarget::parse(&format!("http://{}/app", addr)).unwrap();

        let result = HttpProber::new()
            .probe(&target, Duration::from_millis(200))
            .await;

        assert!(!result.success);
        assert!(result.status_message.contains("timed out"));
    }

    #[tokio::test]
    async fn https_is_reported_unsupported() {
        let target = ProbeTarget::parse("https://127.0.0.1:1/app").unwrap();
        let result = HttpProber::new()
            .probe(&target, Duration::from_secs(1))
            .await;
        assert!(!result.success);
        assert!(result.status_message.contains("unsupported scheme"));
    }
}
