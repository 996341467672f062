// ABOUTME: Remote deployment endpoint: HTTP surface over a running server's host.
// ABOUTME: Routes /deploy and /undeploy, and answers for deployed contexts.

mod handlers;
pub mod protocol;
mod serve;

pub use serve::{ServeError, ServeErrorKind, bind, serve};

use axum::Router;
use axum::routing::get;
use std::sync::Arc;

use crate::host::Host;

/// Build the endpoint router for one server.
///
/// Requests that match no command, or use a method a command does not
/// accept, fall through to the deployed contexts; a request under a running
/// context's mount path is answered by it.
pub fn router(host: Arc<Host>) -> Router {
    Router::new()
        .route(
            "/deploy",
            get(handlers::deploy_from_location)
                .put(handlers::deploy_upload)
                .fallback(handlers::fallback),
        )
        .route(
            "/undeploy",
            get(handlers::undeploy).fallback(handlers::fallback),
        )
        .fallback(handlers::fallback)
        .with_state(host)
}
