// ABOUTME: Minimal HTTP/1.1 client exchange over a raw hyper connection.
// ABOUTME: Shared by the prober and the remote deployer; one request per connection.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

/// Send one request to the host and port of `base` and read the whole reply.
///
/// `path_and_query` replaces whatever path `base` carries. Errors are
/// returned as descriptive strings; callers decide how to classify them.
pub(crate) async fn exchange(
    base: &Uri,
    method: Method,
    path_and_query: &str,
    body: Bytes,
) -> Result<(StatusCode, Bytes), String> {
    let host = base
        .host()
        .ok_or_else(|| "missing host".to_string())?
        .trim_start_matches('[')
        .trim_end_matches(']');
    let port = base.port_u16().unwrap_or(80);
    let authority = base.authority().map(|a| a.as_str()).unwrap_or(host);

    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| format!("connection to {}:{} failed: {}", host, port, e))?;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| format!("HTTP handshake failed: {}", e))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("HTTP connection error: {}", e);
        }
    });

    let req = Request::builder()
        .method(method)
        .uri(path_and_query)
        .header("Host", authority)
        .header("Connection", "close")
        .body(Full::new(body))
        .map_err(|e| format!("failed to build request: {}", e))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("failed to read reply: {}", e))?
        .to_bytes();

    Ok((status, bytes))
}
