//! Error types for the Cloud Files viewer
//!
//! Authentication and download failures are hard errors. Catalog and
//! listing lookups never surface these; they log and return empty results.

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the identity and storage client layer
#[derive(Debug, Error)]
pub enum Error {
    /// The identity service rejected the credentials (HTTP >= 400)
    #[error("authentication failed ({status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// The identity service stayed unavailable for every attempt
    #[error("identity service unavailable after {attempts} attempts")]
    AuthServiceUnavailable { attempts: u32 },

    /// A token was requested but no session exists or can be established
    #[error("authentication data unavailable: {0}")]
    AuthDataUnavailable(String),

    /// The cached expiration timestamp is in a format the client does not know
    #[error("unrecognized token expiration format: {0}")]
    ExpirationFormat(String),

    /// The object to download does not exist (HTTP 404)
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The download request was answered with a status >= 300 other than 404
    #[error("download could not be started (status {status})")]
    DownloadInitiation { status: u16 },

    /// An object record lacks a field the operation needs
    #[error("invalid object metadata: {0}")]
    InvalidObjectMetadata(String),

    /// The byte stream ended before `Content-Length` bytes were received
    #[error("incomplete download: expected {expected} bytes, received {actual}")]
    IncompleteDownload { expected: u64, actual: u64 },

    /// TLS handshake or certificate validation failed
    #[error("transport security error: {0}")]
    TransportSecurity(String),

    /// Transient "service unavailable" answer, used to drive retries
    #[error("service unavailable (status {0})")]
    ServiceUnavailable(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a transient service answer worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ServiceUnavailable(_))
    }
}
