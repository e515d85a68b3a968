//! Error types for filedav resource operations.
//!
//! Every failure is scoped to a single request. [`DavError::status_code`] and
//! [`DavError::client_message`] give the HTTP status and the plain-text body
//! sent to the client; anything more detailed stays in the server log.
//!
//! # Usage
//!
//! ```
//! use filedav_core::error::DavError;
//!
//! let err = DavError::PreconditionFailed;
//! assert_eq!(err.status_code(), http::StatusCode::PRECONDITION_FAILED);
//! assert!(err.client_message().is_none());
//! ```

use std::io;
use std::path::PathBuf;

/// filedav error type.
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    // -----------------------------------------------------------------------
    // Client protocol errors
    // -----------------------------------------------------------------------
    /// A path segment of the request URL contains an invalid percent-escape
    /// or does not decode to UTF-8.
    #[error("malformed percent-encoding in request path: {url}")]
    MalformedPath {
        /// The raw request URL.
        url: String,
    },

    /// PROPFIND was sent with a `Depth` other than `1`.
    #[error("unsupported PROPFIND depth: {depth:?}")]
    UnsupportedDepth {
        /// The header value, if present.
        depth: Option<String>,
    },

    /// The request method has no handler.
    #[error("method not allowed: {method}")]
    MethodNotAllowed {
        /// The request method.
        method: String,
    },

    // -----------------------------------------------------------------------
    // Not-found errors
    // -----------------------------------------------------------------------
    /// The file could not be read (missing, a directory, or not permitted).
    #[error("failed to read file {}", path.display())]
    NotFound {
        /// The resolved path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The directory could not be enumerated.
    #[error("failed to read directory {}", path.display())]
    DirectoryNotFound {
        /// The resolved path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    // -----------------------------------------------------------------------
    // Conditional request errors
    // -----------------------------------------------------------------------
    /// The `If-Match` token does not equal the current fingerprint.
    #[error("If-Match precondition failed")]
    PreconditionFailed,

    // -----------------------------------------------------------------------
    // Server-side errors
    // -----------------------------------------------------------------------
    /// A directory entry could not be stat'ed after enumeration succeeded.
    #[error("failed to stat directory entry {}", path.display())]
    EntryStat {
        /// The resolved path of the entry.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing the file failed (disk full, permission denied, ...).
    #[error("failed to write file {}", path.display())]
    WriteFailed {
        /// The resolved path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The multistatus document could not be produced.
    #[error("failed to serialize response: {0}")]
    Serialization(String),

    // -----------------------------------------------------------------------
    // Transport errors
    // -----------------------------------------------------------------------
    /// The request body was not received in full: either the client went
    /// away or the upload exceeded the chunk ceiling.
    #[error("request body aborted: {reason}")]
    BodyAborted {
        /// What cut the body off.
        reason: String,
    },
}

impl DavError {
    /// The HTTP status code this error maps to.
    ///
    /// [`DavError::BodyAborted`] never reaches the client; its status is only
    /// used for logging.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::MalformedPath { .. } | Self::WriteFailed { .. } => http::StatusCode::BAD_REQUEST,
            Self::UnsupportedDepth { .. } => http::StatusCode::FORBIDDEN,
            Self::MethodNotAllowed { .. } => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound { .. } | Self::DirectoryNotFound { .. } => http::StatusCode::NOT_FOUND,
            Self::PreconditionFailed => http::StatusCode::PRECONDITION_FAILED,
            Self::EntryStat { .. } | Self::Serialization(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BodyAborted { .. } => http::StatusCode::BAD_REQUEST,
        }
    }

    /// The plain-text body sent to the client, if any.
    #[must_use]
    pub fn client_message(&self) -> Option<&'static str> {
        match self {
            Self::MalformedPath { .. } => Some("malformed request path\n"),
            Self::UnsupportedDepth { .. } => Some("PROPFIND requests are limited to `Depth: 1`\n"),
            Self::DirectoryNotFound { .. } => Some("failed to read directory\n"),
            Self::WriteFailed { .. } => Some("failed to write file\n"),
            Self::MethodNotAllowed { .. }
            | Self::NotFound { .. }
            | Self::PreconditionFailed
            | Self::EntryStat { .. }
            | Self::Serialization(_)
            | Self::BodyAborted { .. } => None,
        }
    }

    /// Whether the connection must be dropped instead of answered.
    #[must_use]
    pub fn aborts_connection(&self) -> bool {
        matches!(self, Self::BodyAborted { .. })
    }
}

impl From<std::convert::Infallible> for DavError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Convenience result type for filedav operations.
pub type DavResult<T> = Result<T, DavError>;
