//! Agenda endpoints: calendars, categories and components.
//!
//! Requests under `/api/v1/agenda` are forwarded to the agenda service by
//! the pipeline. These handlers check that the answer is JSON and re-emit it
//! with their own status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::error::ApiError;

type Relayed = Result<Response, ApiError>;

// =============================================================================
// Calendars
// =============================================================================

/// `GET /calendars`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn list_calendars(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}

/// `GET /calendars/{calendar_id}`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn get_calendar(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}

/// `POST /calendars`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn create_calendar(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::CREATED)
}

/// `PATCH /calendars/{calendar_id}`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn patch_calendar(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}

/// `DELETE /calendars/{calendar_id}`.
pub async fn delete_calendar(context: RequestContext) -> impl IntoResponse {
    context.respond(StatusCode::NO_CONTENT, None)
}

// =============================================================================
// Categories
// =============================================================================

/// `GET /categories`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn list_categories(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}

// =============================================================================
// Components
// =============================================================================

/// `POST /components`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn create_component(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::CREATED)
}

/// `GET /components/{component_id}`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn get_component(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}

/// `PATCH /components/{component_id}`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn patch_component(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}

/// `DELETE /components/{component_id}`.
pub async fn delete_component(context: RequestContext) -> impl IntoResponse {
    context.respond(StatusCode::NO_CONTENT, None)
}

/// `GET /components/by-range`.
///
/// # Errors
///
/// Returns an error if the upstream body is not JSON.
pub async fn components_by_range(context: RequestContext) -> Relayed {
    context.relay_json(StatusCode::OK)
}
