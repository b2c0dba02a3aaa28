//! Outbound call error types.

use reqwest::StatusCode;
use thiserror::Error;

/// A result type using `HttpError`.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors produced by the outbound client.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The upstream answered with a 4xx status.
    #[error("upstream client error {status}: {body}")]
    Client {
        /// Status returned by the upstream.
        status: StatusCode,
        /// Response body as text.
        body: String,
    },

    /// The upstream answered with a 5xx status.
    #[error("upstream server error {status}: {body}")]
    Server {
        /// Status returned by the upstream.
        status: StatusCode,
        /// Response body as text.
        body: String,
    },

    /// Every attempt timed out.
    #[error("request to {url} timed out after {attempts} attempt(s)")]
    Timeout {
        /// Target of the request.
        url: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// The connection failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request could not be built or the client could not be created.
    #[error("invalid request: {0}")]
    Build(String),
}

impl HttpError {
    /// Returns the HTTP status the gateway should answer with for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Client { .. } => 400,
            Self::Server { .. } => 503,
            Self::Timeout { .. } => 504,
            Self::Transport(_) | Self::Decode(_) => 502,
            Self::Build(_) => 500,
        }
    }

    /// Upstream status for status-level failures.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
