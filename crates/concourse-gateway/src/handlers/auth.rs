//! Session and user endpoints.
//!
//! Requests under `/api/v1/auth` are forwarded to the authorization service
//! by the pipeline. These handlers only shape its answer and pass the
//! session cookies it set on to the caller.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use concourse_auth::{JwtValidator, UserProfile};
use concourse_chat::ChatService;
use concourse_core::RoleGroup;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Sessions
// =============================================================================

/// Log in: the signed-in user, with the new session cookies.
///
/// # Errors
///
/// Returns an error if the upstream body is not a user profile.
pub async fn login(context: RequestContext) -> Result<impl IntoResponse, ApiError> {
    let user: UserProfile = context.decode_upstream()?;
    tracing::info!(user_id = %user.id, "Session opened");
    Ok(context.respond(StatusCode::OK, Some(user.public_view())))
}

/// Refresh the session cookies.
pub async fn refresh(context: RequestContext) -> impl IntoResponse {
    context.respond(StatusCode::NO_CONTENT, None)
}

/// Log out of the current session.
pub async fn logout(context: RequestContext) -> impl IntoResponse {
    context.respond(StatusCode::NO_CONTENT, None)
}

/// Log out of every session of the caller.
pub async fn logout_all(context: RequestContext) -> impl IntoResponse {
    context.respond(StatusCode::NO_CONTENT, None)
}

// =============================================================================
// Users
// =============================================================================

/// Register a user; the upstream's answer is re-emitted as created.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn register(context: RequestContext) -> Result<impl IntoResponse, ApiError> {
    context.relay_json(StatusCode::CREATED)
}

/// The caller's own profile, without session bookkeeping.
///
/// # Errors
///
/// Returns `AccessDenied` if the caller's role is outside the common group.
pub async fn me<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    context: RequestContext,
) -> Result<impl IntoResponse, ApiError>
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    let user = context.require(RoleGroup::Common, state.config.mode)?;
    Ok(Json(user.public_view()))
}
