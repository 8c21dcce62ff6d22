//! Error type shared by the transport and the cache layer

use thiserror::Error;

/// Errors that can occur when talking to the backend
///
/// Every variant carries owned strings so the error is `Clone`: one failed
/// request is handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status
    ///
    /// `message` is the server's `error` field, or `HTTP <status>` when the
    /// body carried none.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A successful response body was not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Decode(String),

    /// The backend URL and path could not be joined
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The bearer token could not be read from local storage
    #[error("Failed to read auth token: {0}")]
    Token(String),
}

impl ApiError {
    /// Returns the HTTP status for `Status` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
