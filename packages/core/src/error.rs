//! Error types shared across the tree, wire, and remote layers.
//!
//! Semantic errors (path resolution, capability checks) and transport
//! errors live in one enum so that local and remote filesystems can
//! implement the same contract.

/// Errors produced by tree operations, handles, and transport.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A path segment or name does not exist.
    #[error("{path}: not found")]
    NotFound { path: String },

    /// Path traversal hit a File where a Folder was expected.
    #[error("{path}: is a file")]
    IsAFile { path: String },

    /// The named entry is a Folder where a File was expected.
    #[error("{path}: is a directory")]
    IsAFolder { path: String },

    /// Delete on a Folder that still has children.
    #[error("{path}: not empty")]
    NotEmpty { path: String },

    /// Capability mismatch on a handle, or use after close.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    /// Malformed statement or malformed remote command.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Frame send/receive exhausted retries or the peer closed.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// Open-handle cap exceeded.
    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    /// Snapshot could not be written or read back.
    #[error("snapshot error: {message}")]
    Snapshot { message: String },
}

impl Error {
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedOperation {
            message: message.into(),
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Error::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Snapshot {
            message: e.to_string(),
        }
    }
}
