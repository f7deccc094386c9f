//! Client error types

use thiserror::Error;

/// Failures of the local session storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors surfaced to callers of the client library
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// The request never produced a usable response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An operation that needs a session was called without one
    #[error("Not signed in")]
    NotAuthenticated,
}

impl ClientError {
    /// HTTP status of an API rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text for the transient notification shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Http(_) => "Unable to reach the server, please try again".to_string(),
            ClientError::Storage(_) => "Your session could not be saved on this device".to_string(),
            ClientError::NotAuthenticated => "Please sign in to continue".to_string(),
        }
    }
}

/// Type alias for Result with ClientError
pub type ClientResult<T> = Result<T, ClientError>;
