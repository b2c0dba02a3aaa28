//! Authentication error types.

use concourse_http::HttpError;
use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while authenticating or authorizing a caller.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No access credential was present in the cookie jar.
    #[error("access token is missing")]
    Missing,

    /// The credential verified but has expired.
    #[error("access token has expired")]
    Expired,

    /// The credential signature or structure is invalid.
    #[error("invalid access token: {0}")]
    Invalid(String),

    /// The credential could not be decoded at all.
    #[error("cannot decode access token: {0}")]
    Undecodable(String),

    /// The caller is authenticated but lacks the required role.
    #[error("access denied")]
    AccessDenied,

    /// The authorization service reports the account as inactive.
    #[error("user account is inactive")]
    Inactive,

    /// The authorization service call failed.
    #[error("authorization service error: {0}")]
    Upstream(#[from] HttpError),

    /// The verification key or algorithm is misconfigured.
    #[error("auth configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Returns the appropriate HTTP status code for this error.
    ///
    /// A 401 from the authorization service during identity lookup stays a
    /// 401; other upstream failures use the outbound classification.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Missing
            | Self::Expired
            | Self::Invalid(_)
            | Self::Undecodable(_)
            | Self::Inactive => 401,
            Self::AccessDenied => 403,
            Self::Upstream(e) => match e.upstream_status().map(|s| s.as_u16()) {
                Some(401) => 401,
                _ => e.http_status_code(),
            },
            Self::Config(_) => 500,
        }
    }

    /// Short machine-readable name used in error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Missing => "AuthMissing",
            Self::Expired => "AuthExpired",
            Self::Invalid(_) => "AuthInvalid",
            Self::Undecodable(_) => "AuthUndecodable",
            Self::AccessDenied => "AccessDenied",
            Self::Inactive => "UserInactive",
            Self::Upstream(_) => "AuthServiceError",
            Self::Config(_) => "ConfigurationError",
        }
    }
}
