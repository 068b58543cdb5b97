//! Unified error types for swcache.
//!
//! The taxonomy follows the request path: network failures, HTTP-level
//! failures, storage failures and precache manifest failures. Storage errors
//! never abort a request; the policy engine logs them and degrades.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the interception layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unsupported method string).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unparsable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch rejected or failed at the connection level.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch resolved, but with a non-success status.
    #[error("HTTP_ERROR: status {status} for {url}")]
    Http { url: String, status: u16 },

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Store unavailable, quota exceeded or corrupt entry.
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A precache URL failed during install.
    #[error("MANIFEST_ERROR: {url}: {reason}")]
    Manifest { url: String, reason: String },

    /// Lifecycle operation requested from the wrong state.
    #[error("LIFECYCLE_ERROR: {0}")]
    Lifecycle(String),

    /// No cache entry found for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),
}

impl Error {
    /// Whether this error came from the store rather than the network.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Storage(_) | Error::MigrationFailed(_))
    }

    /// Whether this error means the network could not produce a usable response.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Http { .. })
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Network(msg) => (-32006, msg.clone()),
            Error::Http { .. } => (-32008, err.to_string()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::Storage(msg) => (-32002, msg.clone()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Manifest { .. } => (-32013, err.to_string()),
            Error::Lifecycle(msg) => (-32014, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
