// ABOUTME: Line-oriented reply format of the remote deployment endpoint.
// ABOUTME: Shared by the axum handlers that write replies and the client that reads them.

pub const PATH_NOT_SET: &str = "The path variable is not set";
pub const PATH_MUST_START_WITH_SLASH: &str = "The path variable must start with /";
pub const PATH_IN_USE: &str = "The webapp context path is already in use";
pub const ALREADY_DEPLOYED: &str = "An application is already deployed at this context";
pub const PATH_NO_LEADING_SLASH: &str = "The path does not start with a forward slash";
pub const CANNOT_PARSE_URL: &str = "Cannot parse URL";
pub const START_FAILED: &str = "Unexpected error when trying to start the webapp";
pub const UNDEPLOY_PATH_NO_LEADING_SLASH: &str = "Path must start with a forward slash";
pub const NO_HANDLER: &str = "Could not find handler for the context";
pub const STOP_FAILED: &str = "Could not stop context handler";
pub const TRANSFER_FAILED: &str = "Could not write the webapp archive";
pub const INVALID_PATH: &str = "Invalid context path";
pub const WAR_NOT_SET: &str = "The war variable is not set";
pub const INVALID_LOCATION: &str = "Invalid artifact location";

/// One decoded reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(String),
    Error(String),
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Reply::Ok(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }

    /// Parse the first line of a response body.
    pub fn parse(body: &str) -> Option<Self> {
        let line = body.lines().next()?.trim_end();
        if let Some(message) = line.strip_prefix("OK - ") {
            Some(Reply::Ok(message.to_string()))
        } else {
            line.strip_prefix("Error - ")
                .map(|message| Reply::Error(message.to_string()))
        }
    }

    /// Wire form: a single line terminated by `\n`.
    pub fn into_line(self) -> String {
        match self {
            Reply::Ok(message) => format!("OK - {}\n", message),
            Reply::Error(message) => format!("Error - {}\n", message),
        }
    }
}

pub fn deployed(path: &str) -> String {
    format!("Webapp deployed at context {}", path)
}

pub fn undeployed_and_removed(path: &str) -> String {
    format!(
        "Webapp with {} context has been undeployed and removed from the filesystem",
        path
    )
}

pub fn undeployed_not_removed(path: &str) -> String {
    format!(
        "Webapp with {} context has been undeployed but not removed from the filesystem",
        path
    )
}

/// Undeploy succeeded but cleaning up the artifact did not.
pub fn undeployed_with_note(path: &str, note: &str) -> String {
    format!("Webapp with {} context has been undeployed but {}", path, note)
}

/// Whether an OK reply still carries a cleanup problem worth surfacing.
pub fn is_partial_success(message: &str) -> bool {
    message.contains(" has been undeployed but ")
}
