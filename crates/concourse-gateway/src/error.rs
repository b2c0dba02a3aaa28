//! API error types and responses.
//!
//! Every failure raised by the auth gate, the local handlers and non-proxied
//! outbound calls is turned into a JSON body here:
//!
//! ```json
//! {"type": "AuthMissing", "message": "access token is missing", "details": null}
//! ```
//!
//! `details` is filled in only when [`expose_details`] is layered onto the
//! router, which happens outside production or in debug mode.

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use concourse_auth::AuthError;
use concourse_chat::ChatError;
use concourse_http::HttpError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication or authorization failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A non-proxied outbound call failed.
    #[error(transparent)]
    Upstream(#[from] HttpError),

    /// A chat operation failed.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Error name.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Human-readable summary.
    pub message: String,
    /// Diagnostic text, hidden in production.
    pub details: Option<String>,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            Self::Auth(e) => e.http_status_code(),
            Self::Upstream(e) => e.http_status_code(),
            Self::Chat(e) => e.http_status_code(),
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Internal(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the error name for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.kind(),
            Self::Upstream(e) => upstream_kind(e),
            Self::Chat(e) => e.kind(),
            Self::NotFound(_) => "NotFound",
            Self::BadRequest(_) => "BadRequest",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Build the full response body, details included.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            Self::Auth(
                e @ (AuthError::Invalid(_)
                | AuthError::Undecodable(_)
                | AuthError::Upstream(_)
                | AuthError::Config(_)),
            ) => (auth_summary(e).to_string(), Some(e.to_string())),
            Self::Auth(e) => (e.to_string(), None),
            Self::Upstream(e) => ("upstream request failed".to_string(), Some(e.to_string())),
            Self::Chat(
                e @ (ChatError::Generation { .. } | ChatError::Upstream(_) | ChatError::Store(_)),
            ) => (chat_summary(e).to_string(), Some(e.to_string())),
            Self::Chat(e) => (e.to_string(), None),
            Self::NotFound(what) => (format!("{what} not found"), None),
            Self::BadRequest(reason) => (reason.clone(), None),
            Self::Internal(reason) => ("internal server error".to_string(), Some(reason.clone())),
        };

        ErrorBody {
            kind: self.kind(),
            message,
            details,
        }
    }
}

const fn upstream_kind(error: &HttpError) -> &'static str {
    match error {
        HttpError::Client { .. } => "UpstreamClientError",
        HttpError::Server { .. } => "UpstreamServerError",
        HttpError::Timeout { .. } => "UpstreamTimeout",
        HttpError::Transport(_) => "UpstreamUnavailable",
        HttpError::Decode(_) => "UpstreamDecodeError",
        HttpError::Build(_) => "InternalError",
    }
}

const fn auth_summary(error: &AuthError) -> &'static str {
    match error {
        AuthError::Upstream(_) => "authorization service error",
        AuthError::Config(_) => "authentication is misconfigured",
        _ => "invalid access token",
    }
}

const fn chat_summary(error: &ChatError) -> &'static str {
    match error {
        ChatError::Generation { .. } => "reply generation failed",
        ChatError::Store(_) => "storage error",
        _ => "upstream request failed",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = self.body();
        let public = ErrorBody {
            details: None,
            ..body.clone()
        };

        let mut response = (status, Json(public)).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Response middleware that re-renders error bodies with their details.
pub async fn expose_details(mut response: Response) -> Response {
    let Some(body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let mut detailed = (parts.status, Json(body)).into_response();
    for (name, value) in &parts.headers {
        if name != CONTENT_LENGTH && name != CONTENT_TYPE {
            detailed.headers_mut().append(name.clone(), value.clone());
        }
    }
    detailed
}
