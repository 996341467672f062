// ABOUTME: axum handlers for /deploy, /undeploy and requests to deployed contexts.
// ABOUTME: Failures are reported in-band as `Error - ` lines with HTTP 200.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::protocol::{self, Reply};
use crate::host::{Host, HostError, UndeployOutcome};
use crate::types::{MountPath, MountPathError};

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        text(StatusCode::OK, self.into_line())
    }
}

fn text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct DeployParams {
    path: Option<String>,
    war: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathParams {
    path: Option<String>,
}

/// GET /deploy: copy an artifact the server can read into the deployment directory.
pub async fn deploy_from_location(
    State(host): State<Arc<Host>>,
    Query(params): Query<DeployParams>,
) -> Reply {
    let Some(war) = params.war else {
        return Reply::error(protocol::WAR_NOT_SET);
    };
    let context = params.path.unwrap_or_else(|| context_from_war(&war));
    tracing::debug!("Deploying {} at context {}", war, context);

    let path = match MountPath::new(&context) {
        Ok(path) => path,
        Err(MountPathError::MissingLeadingSlash) => {
            return Reply::error(protocol::PATH_NO_LEADING_SLASH);
        }
        Err(e) => return Reply::error(format!("{}: {}", protocol::INVALID_PATH, e)),
    };
    if host.registry().is_taken(&path) {
        return Reply::error(format!("{} : {}", protocol::ALREADY_DEPLOYED, path));
    }

    let Some(source) = war_location(&war) else {
        return Reply::error(format!("{} {}", protocol::CANNOT_PARSE_URL, war));
    };

    match host.deploy_from(&path, &source).await {
        Ok(_) => Reply::ok(protocol::deployed(path.as_str())),
        Err(HostError::PathInUse(path)) => {
            Reply::error(format!("{} : {}", protocol::ALREADY_DEPLOYED, path))
        }
        Err(e) => deploy_failure(e),
    }
}

/// PUT /deploy: stream the request body into the deployment directory.
pub async fn deploy_upload(
    State(host): State<Arc<Host>>,
    Query(params): Query<PathParams>,
    body: Body,
) -> Reply {
    tracing::debug!(
        "Remotely deploying an uploaded archive with context {:?}",
        params.path
    );

    let path = match params.path.as_deref().map(MountPath::new) {
        None | Some(Err(MountPathError::Empty)) => {
            return Reply::error(protocol::PATH_NOT_SET);
        }
        Some(Err(MountPathError::MissingLeadingSlash)) => {
            return Reply::error(protocol::PATH_MUST_START_WITH_SLASH);
        }
        Some(Err(e)) => return Reply::error(format!("{}: {}", protocol::INVALID_PATH, e)),
        Some(Ok(path)) => path,
    };
    if host.registry().is_taken(&path) {
        return Reply::error(protocol::PATH_IN_USE);
    }

    match host.deploy_stream(&path, body.into_data_stream()).await {
        Ok(_) => Reply::ok(protocol::deployed(path.as_str())),
        Err(HostError::PathInUse(_)) => Reply::error(protocol::PATH_IN_USE),
        Err(e) => deploy_failure(e),
    }
}

fn deploy_failure(err: HostError) -> Reply {
    match err {
        HostError::TransferFailed { location, reason } => Reply::error(format!(
            "{} {}: {}",
            protocol::TRANSFER_FAILED,
            location.display(),
            reason
        )),
        HostError::ActivationFailed { .. } => Reply::error(protocol::START_FAILED),
        HostError::Validation(reason) => {
            Reply::error(format!("{}: {}", protocol::INVALID_LOCATION, reason))
        }
        other => Reply::error(other.to_string()),
    }
}

/// GET /undeploy: stop, unregister and clean up a context.
pub async fn undeploy(
    State(host): State<Arc<Host>>,
    Query(params): Query<PathParams>,
) -> Reply {
    let path = match params.path.as_deref().map(MountPath::new) {
        None | Some(Err(MountPathError::Empty)) => {
            return Reply::error(protocol::PATH_NOT_SET);
        }
        Some(Err(MountPathError::MissingLeadingSlash)) => {
            return Reply::error(protocol::UNDEPLOY_PATH_NO_LEADING_SLASH);
        }
        Some(Err(e)) => return Reply::error(format!("{}: {}", protocol::INVALID_PATH, e)),
        Some(Ok(path)) => path,
    };

    match host.undeploy(&path).await {
        Ok(outcome) => Reply::ok(undeploy_message(&path, &outcome)),
        Err(HostError::NotFound(_)) => Reply::error(protocol::NO_HANDLER),
        Err(HostError::StopFailed { .. }) => Reply::error(protocol::STOP_FAILED),
        Err(e) => Reply::error(e.to_string()),
    }
}

fn undeploy_message(path: &MountPath, outcome: &UndeployOutcome) -> String {
    match outcome {
        UndeployOutcome::Removed(_) => protocol::undeployed_and_removed(path.as_str()),
        UndeployOutcome::Retained(_) => protocol::undeployed_not_removed(path.as_str()),
        other => match other.warning() {
            Some(note) => protocol::undeployed_with_note(path.as_str(), &note),
            None => protocol::undeployed_and_removed(path.as_str()),
        },
    }
}

/// Everything else: serve deployed contexts, reject unknown commands.
pub async fn fallback(State(host): State<Arc<Host>>, method: Method, uri: Uri) -> Response {
    let command = uri.path();

    if method == Method::PUT {
        return Reply::error(format!("Command {} is not recognized with PUT", command))
            .into_response();
    }

    match host.registry().resolve(command) {
        Some(context) if context.is_running() => text(
            StatusCode::OK,
            format!(
                "Context {} is running since {}\n",
                context.mount_path(),
                context.deployed_at().to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        ),
        Some(context) => text(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Context {} is stopped\n", context.mount_path()),
        ),
        None => text(
            StatusCode::BAD_REQUEST,
            format!("Command {} is unknown\n", command),
        ),
    }
}

/// Mount path derived from the archive name: `/x/y/shop.war` becomes `/shop`.
fn context_from_war(war: &str) -> String {
    let location = war_location(war).unwrap_or_else(|| PathBuf::from(war));
    let name = location
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".war").unwrap_or(&name);
    format!("/{}", stem)
}

/// Resolve a `war` parameter to a local path.
///
/// Accepts plain paths and `file:` URIs, optionally wrapped in `jar:...!/`.
/// Any other scheme cannot be read by this server.
fn war_location(war: &str) -> Option<PathBuf> {
    let mut location = war.trim();
    if let Some(inner) = location.strip_prefix("jar:") {
        location = inner.strip_suffix("!/").unwrap_or(inner);
    }

    if let Some(rest) = location.strip_prefix("file:") {
        let rest = match rest.strip_prefix("//") {
            Some(authority_and_path) => {
                // file://localhost/x and file:///x both name /x
                let slash = authority_and_path.find('/')?;
                &authority_and_path[slash..]
            }
            None => rest,
        };
        let decoded = urlencoding::decode(rest).ok()?;
        return (!decoded.is_empty()).then(|| PathBuf::from(decoded.into_owned()));
    }

    if location.is_empty() || location.contains("://") {
        return None;
    }
    Some(PathBuf::from(location))
}
