use thiserror::Error;

use crate::caches::CacheError;
use crate::client::command::CommandKind;

/// Error type for remote repository operations.
///
/// Every variant carries enough context (command or URL) to identify the call
/// that failed. Values are `Clone` so a listing iterator can hand the same
/// failure back on every later call.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// A mandatory coordinate was empty. Raised before any network call.
    #[error("{command} command not valid: {field} is missing")]
    Validation {
        command: CommandKind,
        field: &'static str,
    },

    /// The request URL could not be built.
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Connection or I/O failure while talking to the server.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("bad status from {url}: {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    /// The response body did not have the expected shape.
    #[error("failed to parse {command} response: {message}")]
    Parse {
        command: CommandKind,
        message: String,
    },

    /// The caller's cancellation token fired.
    #[error("request to {url} cancelled")]
    Cancelled { url: String },

    /// The response cache could not be built.
    #[error("cache configuration error: {0}")]
    Cache(#[from] CacheError),
}

impl ClientError {
    pub(crate) fn parse(command: CommandKind, err: impl std::fmt::Display) -> Self {
        ClientError::Parse {
            command,
            message: err.to_string(),
        }
    }

    /// Whether the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
