//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state, map_response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use concourse_auth::JwtValidator;
use concourse_chat::ChatService;

use crate::error::expose_details;
use crate::handlers::{agenda, auth, chats, fallback, health, messages};
use crate::pipeline;
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// Every path below sits under the configured API prefix (`/api`).
///
/// # Routes
///
/// ## Health (public)
/// - `GET /health/ping` - Liveness
/// - `GET /health/service_health` - Dependency report
///
/// ## Chats (private)
/// - `GET /v1/chats` - List chats
/// - `POST /v1/chats` - Create chat
/// - `GET /v1/chats/{chat_id}` - Get chat
/// - `PUT /v1/chats/{chat_id}` - Update chat
/// - `DELETE /v1/chats/{chat_id}` - Delete chat
///
/// ## Messages (private, exchange common)
/// - `GET /v1/messages` - List messages
/// - `GET /v1/messages/{id}` - Get message
/// - `PUT /v1/messages/{id}` - Update message
/// - `DELETE /v1/messages/{id}` - Delete message
/// - `POST /v1/messages/{id}/exchange` - Message and reply in chat `id`
/// - `POST /v1/messages/chats/{chat_id}/messages` - Append message
///
/// ## Auth (proxied to the authorization service)
/// - `POST /v1/auth/sessions` - Log in
/// - `PUT /v1/auth/sessions` - Refresh
/// - `DELETE /v1/auth/sessions` - Log out
/// - `DELETE /v1/auth/sessions/all` - Log out everywhere
/// - `POST /v1/auth/users/register` - Register
/// - `GET /v1/auth/users/me` - Caller's profile
///
/// ## Agenda (proxied to the agenda service)
/// - `GET|POST /v1/agenda/calendars`
/// - `GET|PATCH|DELETE /v1/agenda/calendars/{calendar_id}`
/// - `GET /v1/agenda/categories`
/// - `POST /v1/agenda/components`
/// - `GET /v1/agenda/components/by-range`
/// - `GET|PATCH|DELETE /v1/agenda/components/{component_id}`
///
/// Any other path under an upstream prefix is relayed as the upstream
/// answered it.
pub fn create_router<C, V>(state: GatewayState<C, V>) -> Router
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    let config = state.config.clone();
    let cors = build_cors_layer(&config.cors_origins);
    let state = Arc::new(state);

    let api = Router::new()
        // Health
        .route("/health/ping", get(health::ping))
        .route(
            "/health/service_health",
            get(health::service_health::<C, V>),
        )
        // Chats
        .route(
            "/v1/chats",
            get(chats::list_chats::<C, V>).post(chats::create_chat::<C, V>),
        )
        .route(
            "/v1/chats/{chat_id}",
            get(chats::get_chat::<C, V>)
                .put(chats::update_chat::<C, V>)
                .delete(chats::delete_chat::<C, V>),
        )
        // Messages
        .route("/v1/messages", get(messages::list_messages::<C, V>))
        .route(
            "/v1/messages/{id}",
            get(messages::get_message::<C, V>)
                .put(messages::update_message::<C, V>)
                .delete(messages::delete_message::<C, V>),
        )
        .route(
            "/v1/messages/{id}/exchange",
            post(messages::exchange::<C, V>),
        )
        .route(
            "/v1/messages/chats/{chat_id}/messages",
            post(messages::create_message::<C, V>),
        )
        // Auth
        .route(
            "/v1/auth/sessions",
            post(auth::login).put(auth::refresh).delete(auth::logout),
        )
        .route("/v1/auth/sessions/all", axum::routing::delete(auth::logout_all))
        .route("/v1/auth/users/register", post(auth::register))
        .route("/v1/auth/users/me", get(auth::me::<C, V>))
        // Agenda
        .route(
            "/v1/agenda/calendars",
            get(agenda::list_calendars).post(agenda::create_calendar),
        )
        .route(
            "/v1/agenda/calendars/{calendar_id}",
            get(agenda::get_calendar)
                .patch(agenda::patch_calendar)
                .delete(agenda::delete_calendar),
        )
        .route("/v1/agenda/categories", get(agenda::list_categories))
        .route("/v1/agenda/components", post(agenda::create_component))
        .route(
            "/v1/agenda/components/by-range",
            get(agenda::components_by_range),
        )
        .route(
            "/v1/agenda/components/{component_id}",
            get(agenda::get_component)
                .patch(agenda::patch_component)
                .delete(agenda::delete_component),
        );

    // The pipeline sits outside the nest so it sees full request paths.
    let router = Router::new()
        .nest(&config.api_prefix, api)
        .fallback(fallback::relay)
        .layer(from_fn_with_state(
            Arc::clone(&state),
            pipeline::run::<C, V>,
        ));

    let router = if config.expose_error_details() {
        router.layer(map_response(expose_details))
    } else {
        router
    };

    router
        .layer(from_fn(pipeline::log_timing))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
