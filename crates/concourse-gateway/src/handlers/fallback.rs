//! Catch-all for paths with no local handler.

use axum::http::Uri;
use axum::response::Response;

use crate::context::RequestContext;
use crate::error::ApiError;

/// Re-emit the upstream answer for a proxied path; 404 otherwise.
///
/// # Errors
///
/// Returns `NotFound` when the path matched no upstream prefix.
pub async fn relay(context: RequestContext, uri: Uri) -> Result<Response, ApiError> {
    context
        .relay_verbatim()
        .ok_or_else(|| ApiError::NotFound(format!("route {}", uri.path())))
}
