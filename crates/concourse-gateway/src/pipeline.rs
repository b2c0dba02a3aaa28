//! Request pipeline run in front of every local handler.
//!
//! ```text
//! request ──▶ auth gate ──▶ reverse proxy ──▶ freeze context ──▶ handler
//!                 │               │
//!                 ▼               ▼
//!            401 / 403      upstream error relayed as-is
//! ```
//!
//! Each stage either hands the request on or answers it. Stages run strictly
//! in order; the context handlers see is assembled only after both ran.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use concourse_auth::JwtValidator;
use concourse_chat::ChatService;
use concourse_http::OutboundRequest;

use crate::context::{RequestScope, UpstreamPayload};
use crate::cookies;
use crate::error::ApiError;
use crate::headers::{outbound_headers, relay_headers, sanitize_response_headers};
use crate::state::GatewayState;

/// Outcome of one pipeline stage.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next stage.
    Continue(Request),
    /// Answer the caller now; later stages and handlers are skipped.
    Respond(Response),
}

/// Run every stage, then the handler.
pub async fn run<C, V>(
    State(state): State<Arc<GatewayState<C, V>>>,
    request: Request,
    next: Next,
) -> Response
where
    C: ChatService + 'static,
    V: JwtValidator + 'static,
{
    let request = match auth_gate(&state, request).await {
        Flow::Continue(request) => request,
        Flow::Respond(response) => return response,
    };
    let mut request = match reverse_proxy(&state, request).await {
        Flow::Continue(request) => request,
        Flow::Respond(response) => return response,
    };

    RequestScope::freeze(&mut request);
    next.run(request).await
}

/// Authenticate the caller unless the route is on the public allowlist.
pub async fn auth_gate<C, V>(state: &GatewayState<C, V>, mut request: Request) -> Flow
where
    C: ChatService,
    V: JwtValidator,
{
    if state
        .registry
        .is_public(request.method(), request.uri().path())
    {
        return Flow::Continue(request);
    }

    let cookie_header = joined_cookies(request.headers());
    match state.auth.authenticate(cookie_header.as_deref()).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, role = %user.role, "Caller authenticated");
            RequestScope::of(&mut request).set_user(user);
            Flow::Continue(request)
        }
        Err(e) => {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                error = %e,
                "Authentication failed"
            );
            Flow::Respond(ApiError::from(e).into_response())
        }
    }
}

/// Forward requests whose path belongs to an upstream.
///
/// Upstream failures (status 400 and above) are answered directly with the
/// upstream's status, headers and body. On success the response is stored in
/// the request scope and the buffered request body is handed on unchanged.
pub async fn reverse_proxy<C, V>(state: &GatewayState<C, V>, request: Request) -> Flow
where
    C: ChatService,
    V: JwtValidator,
{
    let Some(target) = state
        .registry
        .resolve(request.method(), request.uri().path())
        .map(|route| route.target())
    else {
        return Flow::Continue(request);
    };

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.config.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            return Flow::Respond(
                ApiError::BadRequest(format!("cannot read request body: {e}")).into_response(),
            )
        }
    };

    let outbound = OutboundRequest::new(parts.method.clone(), target.as_str())
        .headers(outbound_headers(&parts.headers, client_ip))
        .raw_query(parts.uri.query())
        .body(body.clone());

    let started = Instant::now();
    let upstream = match state.client.raw_request(outbound).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::warn!(method = %parts.method, target = %target, error = %e, "Proxied call failed");
            return Flow::Respond(ApiError::from(e).into_response());
        }
    };
    tracing::debug!(
        method = %parts.method,
        target = %target,
        status = upstream.status.as_u16(),
        elapsed_ms = started.elapsed().as_millis(),
        "Proxied call completed"
    );

    if upstream.status.is_client_error() || upstream.status.is_server_error() {
        let headers = relay_headers(&upstream.headers);
        let mut response = (upstream.status, upstream.body).into_response();
        *response.headers_mut() = headers;
        return Flow::Respond(response);
    }

    let payload = UpstreamPayload {
        status: upstream.status,
        cookies: cookies::parse_all(upstream.headers.get_all(SET_COOKIE), Utc::now()),
        headers: sanitize_response_headers(&upstream.headers),
        body: upstream.body,
    };

    let mut request = Request::from_parts(parts, Body::from(body));
    RequestScope::of(&mut request).set_upstream(payload);
    Flow::Continue(request)
}

/// Log method, path, status and duration of every request.
pub async fn log_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let millis = started.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        method = %method,
        request_path = %path,
        status = response.status().as_u16(),
        processing_time_ms = (millis * 100.0).round() / 100.0,
        "Request processed"
    );
    response
}

/// All `Cookie` headers of a request as one header value.
fn joined_cookies(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{HeaderValue, Method, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::{any, get};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use concourse_auth::MockJwtValidator;

    use crate::context::RequestContext;
    use crate::state::testing::{session_cookie, test_state, TestChats, TestState};

    /// Echoes what the pipeline left in the context.
    async fn inspect(context: RequestContext, body: String) -> axum::Json<Value> {
        axum::Json(json!({
            "user": context.user().map(|user| user.id),
            "upstream": context.upstream_body().map(|b| String::from_utf8_lossy(b).to_string()),
            "cookies": context.cookies().iter().map(|c| c.key.clone()).collect::<Vec<_>>(),
            "headers": context.headers().map(HeaderMap::len),
            "replayed_body": body,
        }))
    }

    fn app(state: TestState) -> Router {
        let state = Arc::new(state);
        Router::new()
            .route("/api/health/ping", get(inspect))
            .route("/api/v1/chats", get(inspect))
            .route("/api/v1/agenda/{*rest}", any(inspect))
            .route("/api/v1/auth/{*rest}", any(inspect))
            .layer(from_fn_with_state(
                Arc::clone(&state),
                run::<TestChats, MockJwtValidator>,
            ))
            .with_state(state)
    }

    async fn call(app: Router, request: axum::http::Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7, "email": "ada@example.com", "role": "user", "is_active": true
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn public_route_needs_no_credentials() {
        let (state, _dir) = test_state("http://127.0.0.1:9");
        let request = axum::http::Request::get("/api/health/ping")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], Value::Null);
        assert_eq!(body["upstream"], Value::Null);
    }

    #[tokio::test]
    async fn protected_route_without_cookie_is_rejected() {
        let (state, _dir) = test_state("http://127.0.0.1:9");
        let request = axum::http::Request::get("/api/v1/chats")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["type"], "AuthMissing");
    }

    #[tokio::test]
    async fn invalid_token_never_reaches_identity_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/users/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri());
        let request = axum::http::Request::get("/api/v1/chats")
            .header(COOKIE, "access_token=forged")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["type"], "AuthInvalid");
    }

    #[tokio::test]
    async fn authenticated_caller_reaches_handler() {
        let server = MockServer::start().await;
        mount_me(&server).await;

        let (state, _dir) = test_state(&server.uri());
        let request = axum::http::Request::get("/api/v1/chats")
            .header(COOKIE, session_cookie("7"))
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], 7);
        assert_eq!(body["upstream"], Value::Null);
    }

    #[tokio::test]
    async fn proxied_success_populates_context() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/calendars"))
            .and(query_param("page", "2"))
            .and(body_string("{\"name\":\"work\"}"))
            .and(header_exists("x-forwarded-for"))
            .and(header_exists("x-device-fingerprint"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-request-id", "r-1")
                    .append_header("set-cookie", "a=1; Path=/")
                    .append_header("set-cookie", "b=2; HttpOnly")
                    .set_body_string("{\"id\":3}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri());
        let request = axum::http::Request::post("/api/v1/agenda/calendars?page=2")
            .header(COOKIE, session_cookie("7"))
            .body(Body::from("{\"name\":\"work\"}"))
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], 7);
        assert_eq!(body["upstream"], "{\"id\":3}");
        assert_eq!(body["cookies"], json!(["a", "b"]));
        assert_eq!(body["replayed_body"], "{\"name\":\"work\"}");
    }

    #[tokio::test]
    async fn upstream_error_is_relayed_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/sessions"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-upstream", "auth")
                    .set_body_string("{\"detail\":\"no such user\"}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (state, _dir) = test_state(&server.uri());
        let request = axum::http::Request::post("/api/v1/auth/sessions")
            .body(Body::from("{}"))
            .unwrap();

        let (status, headers, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers["x-upstream"], "auth");
        // The handler would have answered with a context dump, not this.
        assert_eq!(body, json!({"detail": "no such user"}));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_gateway_error() {
        let (state, _dir) = test_state("http://127.0.0.1:9");
        let request = axum::http::Request::post("/api/v1/auth/sessions")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert!(status.is_server_error());
        assert!(body["type"].as_str().unwrap().starts_with("Upstream"));
    }

    #[tokio::test]
    async fn concurrent_requests_resolve_independent_identities() {
        let server = MockServer::start().await;
        for id in 1..=5 {
            Mock::given(method("GET"))
                .and(path("/api/v1/users/me"))
                .and(header("cookie", format!("access_token=test-token:{id}").as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": id, "email": format!("u{id}@example.com"), "role": "user"
                })))
                .mount(&server)
                .await;
        }

        let (state, _dir) = test_state(&server.uri());
        let app = app(state);

        let calls = (1..=5).flat_map(|id| {
            let authed = axum::http::Request::get("/api/v1/chats")
                .header(COOKIE, session_cookie(&id.to_string()))
                .body(Body::empty())
                .unwrap();
            let anonymous = axum::http::Request::get("/api/v1/chats")
                .body(Body::empty())
                .unwrap();
            [(Some(id), authed), (None, anonymous)]
        });

        let results = futures::future::join_all(calls.map(|(id, request)| {
            let app = app.clone();
            async move { (id, call(app, request).await) }
        }))
        .await;

        for (id, (status, _, body)) in results {
            match id {
                Some(id) => {
                    assert_eq!(status, StatusCode::OK);
                    assert_eq!(body["user"], id);
                }
                None => {
                    assert_eq!(status, StatusCode::UNAUTHORIZED);
                    assert_eq!(body["type"], "AuthMissing");
                }
            }
        }
    }

    #[test]
    fn cookie_headers_are_joined() {
        let mut headers = HeaderMap::new();
        assert_eq!(joined_cookies(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("access_token=t"));
        assert_eq!(joined_cookies(&headers).as_deref(), Some("a=1; access_token=t"));
    }

    #[tokio::test]
    async fn public_methods_are_exact() {
        let (state, _dir) = test_state("http://127.0.0.1:9");
        let request = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri("/api/v1/auth/sessions")
            .body(Body::empty())
            .unwrap();

        let (status, _, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["type"], "AuthMissing");
    }
}
