//! Per-request state shared between the pipeline stages and handlers.
//!
//! Stages write into a [`RequestScope`] stored in the request extensions.
//! Once every stage has run, the scope is frozen into a [`RequestContext`],
//! which handlers read through the extractor of the same name.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::FromRequestParts;
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use concourse_auth::{require_role, AuthError, UserProfile};
use concourse_core::{RoleGroup, RunMode};
use concourse_http::HttpError;

use crate::cookies::UpstreamCookie;
use crate::error::ApiError;

/// What a successful proxied call returned.
#[derive(Debug, Clone)]
pub struct UpstreamPayload {
    /// Upstream status.
    pub status: StatusCode,
    /// Raw response body.
    pub body: Bytes,
    /// Cookies set by the upstream, in header order.
    pub cookies: Vec<UpstreamCookie>,
    /// Sanitized response headers.
    pub headers: HeaderMap,
}

/// Mutable bag the pipeline stages write into. Exclusive to one request.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    user: Option<UserProfile>,
    upstream: Option<UpstreamPayload>,
}

impl RequestScope {
    /// Record the authenticated caller.
    pub fn set_user(&mut self, user: UserProfile) {
        self.user = Some(user);
    }

    /// Record the proxied response.
    pub fn set_upstream(&mut self, upstream: UpstreamPayload) {
        self.upstream = Some(upstream);
    }

    /// The scope of `request`, created on first access.
    pub fn of<B>(request: &mut Request<B>) -> &mut Self {
        request.extensions_mut().get_or_insert_default::<Self>()
    }

    /// Replace the scope in `request` with its frozen context.
    pub fn freeze<B>(request: &mut Request<B>) {
        let scope = request
            .extensions_mut()
            .remove::<Self>()
            .unwrap_or_default();
        request.extensions_mut().insert(RequestContext {
            inner: Arc::new(scope),
        });
    }
}

/// Read-only view of everything the pipeline learned about a request.
///
/// Extracting it never fails: without a pipeline every field is empty.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    inner: Arc<RequestScope>,
}

impl RequestContext {
    /// The authenticated caller, if the route was protected.
    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.inner.user.as_ref()
    }

    /// The caller, if their role belongs to `group`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccessDenied` (403) otherwise.
    pub fn require(&self, group: RoleGroup, mode: RunMode) -> Result<&UserProfile, ApiError> {
        let user = self.user();
        require_role(user, group, mode)?;
        user.ok_or(ApiError::Auth(AuthError::AccessDenied))
    }

    /// The proxied response, if the request was forwarded.
    #[must_use]
    pub fn upstream(&self) -> Option<&UpstreamPayload> {
        self.inner.upstream.as_ref()
    }

    /// Raw body of the proxied response.
    #[must_use]
    pub fn upstream_body(&self) -> Option<&Bytes> {
        self.upstream().map(|upstream| &upstream.body)
    }

    /// Cookies set by the proxied response.
    #[must_use]
    pub fn cookies(&self) -> &[UpstreamCookie] {
        self.upstream()
            .map_or(&[][..], |upstream| upstream.cookies.as_slice())
    }

    /// Sanitized headers of the proxied response.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.upstream().map(|upstream| &upstream.headers)
    }

    /// Decode the proxied body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` when nothing was proxied and
    /// `ApiError::Upstream` when the body is not valid JSON for `T`.
    pub fn decode_upstream<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = self
            .upstream_body()
            .ok_or_else(|| ApiError::Internal("no upstream response for this route".to_string()))?;
        serde_json::from_slice(body)
            .map_err(|e| ApiError::Upstream(HttpError::Decode(e.to_string())))
    }

    /// Respond with `status`, an optional JSON body and the upstream cookies.
    #[must_use]
    pub fn respond(&self, status: StatusCode, body: Option<Value>) -> Response {
        let mut response = match body {
            Some(body) => (status, axum::Json(body)).into_response(),
            None => status.into_response(),
        };
        self.attach_cookies(response.headers_mut());
        response
    }

    /// Respond with the proxied body validated as JSON, re-emitted under `status`.
    ///
    /// # Errors
    ///
    /// See [`RequestContext::decode_upstream`].
    pub fn relay_json(&self, status: StatusCode) -> Result<Response, ApiError> {
        let body: Value = self.decode_upstream()?;
        Ok(self.respond(status, Some(body)))
    }

    /// Re-emit the proxied response as received, with its cookies.
    ///
    /// Returns `None` when the request was not proxied.
    #[must_use]
    pub fn relay_verbatim(&self) -> Option<Response> {
        let upstream = self.upstream()?;
        let mut response = (upstream.status, upstream.body.clone()).into_response();
        for (name, value) in &upstream.headers {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        self.attach_cookies(response.headers_mut());
        Some(response)
    }

    fn attach_cookies(&self, headers: &mut HeaderMap) {
        for cookie in self.cookies() {
            if let Some(value) = cookie.to_header_value() {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use concourse_core::{Role, UserId};
    use serde_json::json;

    fn user() -> UserProfile {
        UserProfile {
            id: UserId::new(7),
            email: "ada@example.com".into(),
            role: Role::User,
            is_active: true,
            extra: serde_json::Map::new(),
        }
    }

    fn payload(body: &'static str) -> UpstreamPayload {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        UpstreamPayload {
            status: StatusCode::ACCEPTED,
            body: Bytes::from_static(body.as_bytes()),
            cookies: vec![UpstreamCookie::parse("access_token=abc; HttpOnly", Utc::now()).unwrap()],
            headers,
        }
    }

    fn frozen(scope: RequestScope) -> RequestContext {
        let mut request = Request::new(Body::empty());
        *RequestScope::of(&mut request) = scope;
        RequestScope::freeze(&mut request);
        request.extensions().get::<RequestContext>().cloned().unwrap()
    }

    #[test]
    fn empty_scope_freezes_to_empty_context() {
        let context = frozen(RequestScope::default());
        assert!(context.user().is_none());
        assert!(context.upstream_body().is_none());
        assert!(context.cookies().is_empty());
        assert!(context.headers().is_none());
    }

    #[test]
    fn scope_fields_survive_freezing() {
        let mut scope = RequestScope::default();
        scope.set_user(user());
        scope.set_upstream(payload(r#"{"ok": true}"#));

        let context = frozen(scope);
        assert_eq!(context.user().unwrap().id, UserId::new(7));
        assert_eq!(context.cookies().len(), 1);
        assert_eq!(context.decode_upstream::<Value>().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn relay_json_rejects_invalid_body() {
        let mut scope = RequestScope::default();
        scope.set_upstream(payload("not json"));
        let context = frozen(scope);

        let err = context.relay_json(StatusCode::OK).unwrap_err();
        assert!(matches!(err, ApiError::Upstream(HttpError::Decode(_))));
    }

    #[test]
    fn respond_attaches_cookies() {
        let mut scope = RequestScope::default();
        scope.set_upstream(payload("{}"));
        let response = frozen(scope).respond(StatusCode::NO_CONTENT, None);

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("access_token=abc; Path=/"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn verbatim_relay_keeps_status_and_headers() {
        let mut scope = RequestScope::default();
        scope.set_upstream(payload("[1,2]"));
        let response = frozen(scope).relay_verbatim().unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert!(response.headers().contains_key(SET_COOKIE));

        assert!(RequestContext::default().relay_verbatim().is_none());
    }
}
