//! Upstream prefixes and public allowlist of the running system.

use axum::http::Method;

use crate::config::UpstreamsConfig;
use crate::registry::{MethodSelector, Result, RewriteRule, RouteRegistry, StripRule};

/// Prefix forwarded to the authorization service.
pub const AUTH_PREFIX: &str = "/api/v1/auth";
/// Prefix forwarded to the agenda service.
pub const AGENDA_PREFIX: &str = "/api/v1/agenda";
/// Prefix forwarded to the snapshot service.
pub const SNAPSHOT_PREFIX: &str = "/api/v1/snapshot";

/// Build the registry every gateway process starts with.
///
/// # Errors
///
/// Returns an error if a seed entry is rejected, which aborts startup.
pub fn build_registry(upstreams: &UpstreamsConfig) -> Result<RouteRegistry> {
    let mut registry = RouteRegistry::new();

    registry.register(
        AUTH_PREFIX,
        &upstreams.auth_url,
        vec![
            RewriteRule::new(Method::POST, "^/users/", "/api/v1/users/register")?,
            RewriteRule::new(Method::GET, "^/users/me", "/api/v1/users/me")?,
        ],
        None,
    )?;
    registry.register(
        AGENDA_PREFIX,
        &upstreams.agenda_url,
        Vec::new(),
        Some(StripRule::Literal("/agenda".to_string())),
    )?;
    registry.register(SNAPSHOT_PREFIX, &upstreams.snapshot_url, Vec::new(), None)?;

    for path in ["/docs", "/openapi.json", "/docs/openapi.json"] {
        registry.add_public(MethodSelector::Any, path);
    }
    registry.add_public(Method::POST.into(), "/api/v1/auth/sessions");
    registry.add_public(Method::PUT.into(), "/api/v1/auth/sessions");
    registry.add_public(Method::POST.into(), "/api/v1/auth/users/register");
    registry.add_public(Method::GET.into(), "/api/health/*");

    for route in registry.routes() {
        tracing::info!(
            prefix = %route.prefix(),
            upstream = %route.upstream_base(),
            "Forwarding prefix"
        );
    }
    tracing::info!(
        prefixes = registry.routes().len(),
        "Route registry loaded"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstreams() -> UpstreamsConfig {
        UpstreamsConfig {
            auth_url: "http://auth".into(),
            agenda_url: "http://agenda/".into(),
            snapshot_url: "http://snapshot".into(),
        }
    }

    #[test]
    fn seeded_rewrites() {
        let registry = build_registry(&upstreams()).unwrap();

        let login = registry.resolve(&Method::POST, "/api/v1/auth/sessions").unwrap();
        assert_eq!(login.target(), "http://auth/api/v1/auth/sessions");

        let register = registry
            .resolve(&Method::POST, "/api/v1/auth/users/register")
            .unwrap();
        assert_eq!(register.target(), "http://auth/api/v1/users/register");

        let me = registry.resolve(&Method::GET, "/api/v1/auth/users/me").unwrap();
        assert_eq!(me.target(), "http://auth/api/v1/users/me");

        let calendars = registry
            .resolve(&Method::GET, "/api/v1/agenda/calendars/3")
            .unwrap();
        assert_eq!(calendars.target(), "http://agenda/api/v1/calendars/3");

        let snapshot = registry.resolve(&Method::GET, "/api/v1/snapshot/latest").unwrap();
        assert_eq!(snapshot.target(), "http://snapshot/api/v1/snapshot/latest");
    }

    #[test]
    fn seeded_prefixes_in_order() {
        let registry = build_registry(&upstreams()).unwrap();
        let routes: Vec<_> = registry
            .routes()
            .iter()
            .map(|route| (route.prefix(), route.upstream_base()))
            .collect();
        assert_eq!(
            routes,
            vec![
                (AUTH_PREFIX, "http://auth"),
                (AGENDA_PREFIX, "http://agenda"),
                (SNAPSHOT_PREFIX, "http://snapshot"),
            ]
        );
    }

    #[test]
    fn seeded_public_routes_ignore_credentials() {
        let registry = build_registry(&upstreams()).unwrap();
        let public = [
            (Method::GET, "/docs"),
            (Method::PATCH, "/openapi.json"),
            (Method::POST, "/api/v1/auth/sessions"),
            (Method::PUT, "/api/v1/auth/sessions"),
            (Method::POST, "/api/v1/auth/users/register"),
            (Method::GET, "/api/health/ping"),
            (Method::GET, "/api/health/service_health"),
        ];
        for (method, path) in &public {
            assert!(registry.is_public(method, path), "{method} {path}");
        }

        assert!(!registry.is_public(&Method::DELETE, "/api/v1/auth/sessions"));
        assert!(!registry.is_public(&Method::GET, "/api/v1/auth/users/me"));
        assert!(!registry.is_public(&Method::GET, "/api/v1/chats"));
    }

    #[test]
    fn local_paths_are_not_forwarded() {
        let registry = build_registry(&upstreams()).unwrap();
        assert!(registry.resolve(&Method::GET, "/api/v1/chats").is_none());
        assert!(registry.resolve(&Method::GET, "/api/health/ping").is_none());
    }
}
