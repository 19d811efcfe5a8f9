use std::fmt;

/// Result type for gamewatch-protocols operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while probing a server.
///
/// Every variant means the same thing to the poller: the server is offline.
#[derive(Debug)]
pub enum Error {
    /// Socket operation failed (refused, unreachable, reset, ...)
    Io(std::io::Error),

    /// No complete reply within the probe timeout
    Timeout,

    /// Host could not be resolved to a usable address
    Resolve(String),

    /// Reply ended before a required field
    Truncated(&'static str),

    /// Reply carried an unexpected packet type or header
    UnexpectedResponse(String),

    /// Minecraft status JSON could not be decoded
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Timeout => write!(f, "Probe timed out"),
            Error::Resolve(msg) => write!(f, "Resolve error: {}", msg),
            Error::Truncated(field) => write!(f, "Response truncated before {}", field),
            Error::UnexpectedResponse(msg) => write!(f, "Unexpected response: {}", msg),
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Timeout
            | Error::Resolve(_)
            | Error::Truncated(_)
            | Error::UnexpectedResponse(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}
