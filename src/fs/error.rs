use std::io;

use thiserror::Error;

use crate::client::ClientError;

/// Error type for filesystem operations.
///
/// Mirrors the path-error convention of a local filesystem: every variant
/// names the path it was raised for.
#[derive(Debug, Clone, Error)]
pub enum FsError {
    /// The path is malformed, or names the wrong kind of node for the operation.
    #[error("{op} {path}: invalid argument")]
    InvalidPath { op: &'static str, path: String },

    /// Nothing with that name exists in the parent listing.
    #[error("open {path}: file does not exist")]
    NotFound { path: String },

    /// The underlying remote call failed.
    #[error("{op} {path}: {source}")]
    Client {
        op: &'static str,
        path: String,
        #[source]
        source: ClientError,
    },
}

impl FsError {
    pub(crate) fn invalid(op: &'static str, path: impl Into<String>) -> Self {
        FsError::InvalidPath {
            op,
            path: path.into(),
        }
    }

    pub(crate) fn client(op: &'static str, path: impl Into<String>, source: ClientError) -> Self {
        FsError::Client {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }

    pub fn is_invalid_path(&self) -> bool {
        matches!(self, FsError::InvalidPath { .. })
    }
}

impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        let kind = match &e {
            FsError::NotFound { .. } => io::ErrorKind::NotFound,
            FsError::InvalidPath { .. } => io::ErrorKind::InvalidInput,
            FsError::Client { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
