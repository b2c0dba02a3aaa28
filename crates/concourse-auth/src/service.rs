//! Caller authentication and role checks.

use std::sync::Arc;

use concourse_core::{RoleGroup, RunMode};

use crate::error::{AuthError, Result};
use crate::identity::{IdentityClient, UserProfile};
use crate::jwt::JwtValidator;

/// Find the value of cookie `name` in a raw `Cookie` header.
#[must_use]
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Verifies a caller's credential and resolves their canonical identity.
pub struct AuthService<V: JwtValidator> {
    validator: Arc<V>,
    identity: IdentityClient,
    access_cookie: String,
}

impl<V: JwtValidator> AuthService<V> {
    /// Create a new auth service.
    #[must_use]
    pub fn new(validator: Arc<V>, identity: IdentityClient, access_cookie: impl Into<String>) -> Self {
        Self {
            validator,
            identity,
            access_cookie: access_cookie.into(),
        }
    }

    /// The identity client, for health checks.
    #[must_use]
    pub const fn identity(&self) -> &IdentityClient {
        &self.identity
    }

    /// Authenticate the caller owning `cookie_header`.
    ///
    /// The access token is verified locally first; only a token that passes
    /// is sent on to the authorization service for the current profile.
    ///
    /// # Errors
    ///
    /// - `AuthError::Missing` if the access cookie is absent
    /// - `AuthError::Expired`, `Invalid` or `Undecodable` from local verification
    /// - `AuthError::Upstream` if the profile lookup fails
    /// - `AuthError::Inactive` if the account is disabled
    pub async fn authenticate(&self, cookie_header: Option<&str>) -> Result<UserProfile> {
        let cookies = cookie_header.unwrap_or_default();
        let token = cookie_value(cookies, &self.access_cookie).ok_or(AuthError::Missing)?;

        let claims = self.validator.validate(token).await?;
        tracing::debug!(sub = %claims.sub, "Access token verified");

        let user = self.identity.current_user(cookies).await?;
        if !user.is_active {
            tracing::info!(user_id = %user.id, "Rejected inactive user");
            return Err(AuthError::Inactive);
        }

        Ok(user)
    }
}

/// Check that `user` belongs to `group` under `mode`.
///
/// # Errors
///
/// Returns `AuthError::AccessDenied` if there is no user or their role is not
/// part of the group.
pub fn require_role(user: Option<&UserProfile>, group: RoleGroup, mode: RunMode) -> Result<()> {
    match user {
        Some(user) if group.allows(user.role, mode) => Ok(()),
        _ => Err(AuthError::AccessDenied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::MockJwtValidator;
    use concourse_core::{Role, UserId};
    use concourse_http::{OutboundClient, OutboundConfig};
    use serde_json::{json, Map};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: UserId::new(1),
            email: "a@example.com".to_string(),
            role,
            is_active: true,
            extra: Map::new(),
        }
    }

    async fn service(server: &MockServer) -> AuthService<MockJwtValidator> {
        let client = Arc::new(OutboundClient::new(OutboundConfig::default()).unwrap());
        AuthService::new(
            Arc::new(MockJwtValidator),
            IdentityClient::new(client, server.uri()),
            "access_token",
        )
    }

    #[test]
    fn cookie_lookup() {
        let header = "theme=dark; access_token=abc; refresh_token=\"def\"";
        assert_eq!(cookie_value(header, "access_token"), Some("abc"));
        assert_eq!(cookie_value(header, "refresh_token"), Some("def"));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("access_token=", "access_token"), None);
    }

    #[tokio::test]
    async fn missing_cookie_is_rejected_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = service(&server).await;
        assert!(matches!(
            auth.authenticate(None).await,
            Err(AuthError::Missing)
        ));
        assert!(matches!(
            auth.authenticate(Some("theme=dark")).await,
            Err(AuthError::Missing)
        ));
    }

    #[tokio::test]
    async fn expired_token_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let auth = service(&server).await;
        let err = auth
            .authenticate(Some("access_token=expired"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[tokio::test]
    async fn valid_token_resolves_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9, "email": "u@example.com", "role": "user", "is_active": true
            })))
            .mount(&server)
            .await;

        let auth = service(&server).await;
        let user = auth
            .authenticate(Some("access_token=test-token:9"))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::new(9));
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn inactive_user_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 9, "email": "u@example.com", "role": "user", "is_active": false
            })))
            .mount(&server)
            .await;

        let auth = service(&server).await;
        let err = auth
            .authenticate(Some("access_token=test-token:9"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Inactive));
    }

    #[tokio::test]
    async fn concurrent_callers_resolve_independently() {
        let server = MockServer::start().await;
        for (token, id) in [("test-token:1", 1), ("test-token:2", 2)] {
            Mock::given(method("GET"))
                .and(path("/api/v1/users/me"))
                .and(wiremock::matchers::header(
                    "cookie",
                    format!("access_token={token}").as_str(),
                ))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": id, "email": "u@example.com", "role": "user"
                })))
                .mount(&server)
                .await;
        }

        let auth = Arc::new(service(&server).await);
        let mut handles = Vec::new();
        for i in 0..20_i64 {
            let auth = Arc::clone(&auth);
            handles.push(tokio::spawn(async move {
                let id = i % 2 + 1;
                let cookie = format!("access_token=test-token:{id}");
                let user = auth.authenticate(Some(&cookie)).await.unwrap();
                assert_eq!(user.id, UserId::new(id));
                assert!(matches!(
                    auth.authenticate(None).await,
                    Err(AuthError::Missing)
                ));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[test]
    fn role_checks() {
        let admin = profile(Role::Admin);
        let developer = profile(Role::Developer);
        let user = profile(Role::User);

        assert!(require_role(Some(&admin), RoleGroup::Staff, RunMode::Prod).is_ok());
        assert!(require_role(Some(&user), RoleGroup::Common, RunMode::Prod).is_ok());
        assert!(require_role(Some(&user), RoleGroup::Staff, RunMode::Dev).is_err());
        assert!(require_role(Some(&developer), RoleGroup::Private, RunMode::Dev).is_ok());
        assert!(matches!(
            require_role(Some(&developer), RoleGroup::Private, RunMode::Prod),
            Err(AuthError::AccessDenied)
        ));
        assert!(matches!(
            require_role(None, RoleGroup::Common, RunMode::Dev),
            Err(AuthError::AccessDenied)
        ));
    }
}
