//! Health check endpoints.
//!
//! Both endpoints are public. `ping` only proves the process is serving;
//! `service_health` checks every dependency and reports each one.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use concourse_auth::JwtValidator;
use concourse_chat::ChatService;
use concourse_core::{DependencyHealth, DependencyType, HealthReport};

use crate::state::GatewayState;

/// Liveness check.
///
/// ```text
/// GET /api/health/ping
///
/// Response: 204 No Content
/// ```
pub async fn ping() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Dependency health report.
///
/// Checks the chat store, the authorization and snapshot services and every
/// registered reply generator. The overall status is `OK` only if every
/// dependency is.
///
/// ```text
/// GET /api/health/service_health
///
/// Response: 200 OK
/// {
///   "status": "OK",
///   "deps": [
///     {"name": "Chat store", "status": "OK", "type": "database", "details": null},
///     ...
///   ]
/// }
/// ```
pub async fn service_health<C, V>(State(state): State<Arc<GatewayState<C, V>>>) -> impl IntoResponse
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    let (store, auth, snapshot, agents) = tokio::join!(
        state.chats.ping(),
        state.auth.identity().ping(),
        state.snapshot.ping(),
        state.agents.ping_agents(None),
    );

    let mut deps = vec![
        dependency("Chat store", DependencyType::Database, store),
        dependency("Authentication Service", DependencyType::Http, auth),
        dependency("Snapshot Service", DependencyType::Http, snapshot),
    ];
    deps.extend(agents);

    (StatusCode::OK, Json(HealthReport::from_deps(deps)))
}

fn dependency<E: std::fmt::Display>(
    name: &str,
    kind: DependencyType,
    result: Result<(), E>,
) -> DependencyHealth {
    match result {
        Ok(()) => DependencyHealth::ok(name, kind),
        Err(e) => {
            tracing::error!(dependency = %name, error = %e, "Health check failed");
            DependencyHealth::failed(name, kind, e)
        }
    }
}
