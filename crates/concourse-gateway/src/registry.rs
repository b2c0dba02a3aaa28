//! Route registry.
//!
//! The registry maps path prefixes to upstream services and holds the public
//! allowlist consulted before authentication. It is filled once while the
//! process starts and only read afterwards, so it is shared behind an `Arc`
//! without any locking.
//!
//! # Resolution
//!
//! ```text
//! path ──▶ first registered prefix that path starts with
//!            │
//!            ├─ tail = path without the prefix
//!            ├─ first rewrite rule matching (method, tail) ──▶ replacement
//!            └─ otherwise strip transform on the full path ──▶ stripped path
//! ```

use axum::http::Method;
use regex::Regex;
use thiserror::Error;

/// A result type using `RegistryError`.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while loading the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The prefix is already registered.
    #[error("prefix {0} is already registered")]
    DuplicatePrefix(String),

    /// A rewrite or strip pattern is not a valid regular expression.
    #[error("invalid pattern {pattern}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },
}

/// Selects the HTTP methods a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSelector {
    /// Every method.
    Any,
    /// Exactly one method.
    Exact(Method),
}

impl MethodSelector {
    /// Whether `method` is selected.
    #[must_use]
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == method,
        }
    }
}

impl From<Method> for MethodSelector {
    fn from(method: Method) -> Self {
        Self::Exact(method)
    }
}

/// Replaces the whole forwarded path when method and tail match.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    method: MethodSelector,
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidPattern` if `pattern` does not compile.
    pub fn new(
        method: impl Into<MethodSelector>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            method: method.into(),
            pattern: compile(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// The pattern only matches at the start of the tail.
    fn matches(&self, method: &Method, tail: &str) -> bool {
        self.method.matches(method)
            && self.pattern.find(tail).is_some_and(|found| found.start() == 0)
    }
}

/// Removes one fragment from the full path before forwarding.
#[derive(Debug, Clone)]
pub enum StripRule {
    /// Remove the first occurrence of a literal substring.
    Literal(String),
    /// Remove the first match of a pattern.
    Pattern(Regex),
}

impl StripRule {
    /// Build a pattern strip rule.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidPattern` if `pattern` does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        compile(pattern).map(Self::Pattern)
    }

    /// Apply the rule to `path`.
    #[must_use]
    pub fn apply(&self, path: &str) -> String {
        match self {
            Self::Literal(fragment) => path.replacen(fragment.as_str(), "", 1),
            Self::Pattern(pattern) => pattern.replace(path, "").into_owned(),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// One registered upstream prefix.
#[derive(Debug, Clone)]
pub struct ServiceRoute {
    prefix: String,
    upstream_base: String,
    rules: Vec<RewriteRule>,
    strip: Option<StripRule>,
}

impl ServiceRoute {
    /// The registered prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Base address of the upstream.
    #[must_use]
    pub fn upstream_base(&self) -> &str {
        &self.upstream_base
    }
}

/// A method and path (or path prefix) exempt from authentication.
#[derive(Debug, Clone)]
pub struct PublicRoute {
    method: MethodSelector,
    path: String,
}

impl PublicRoute {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.matches(method) && path.starts_with(&self.path)
    }
}

/// Where a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    /// Base address of the upstream.
    pub upstream_base: &'a str,
    /// Path to request on the upstream.
    pub path: String,
}

impl ResolvedRoute<'_> {
    /// Absolute upstream URL, without query string.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}{}", self.upstream_base, self.path)
    }
}

/// Prefix table and public allowlist.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<ServiceRoute>,
    public: Vec<PublicRoute>,
}

impl RouteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an upstream prefix.
    ///
    /// Prefixes are matched in registration order; a prefix that starts with
    /// an earlier one can never be reached and is logged as shadowed.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicatePrefix` if `prefix` is already registered.
    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        upstream_base: impl Into<String>,
        rules: Vec<RewriteRule>,
        strip: Option<StripRule>,
    ) -> Result<()> {
        let prefix = prefix.into();
        if self.routes.iter().any(|route| route.prefix == prefix) {
            return Err(RegistryError::DuplicatePrefix(prefix));
        }

        if let Some(earlier) = self
            .routes
            .iter()
            .find(|route| prefix.starts_with(&route.prefix))
        {
            tracing::warn!(
                prefix = %prefix,
                shadowed_by = %earlier.prefix,
                "Registered prefix is shadowed by an earlier one"
            );
        }

        let upstream_base = upstream_base.into().trim_end_matches('/').to_string();
        tracing::debug!(prefix = %prefix, upstream = %upstream_base, rules = rules.len(), "Registered upstream prefix");

        self.routes.push(ServiceRoute {
            prefix,
            upstream_base,
            rules,
            strip,
        });
        Ok(())
    }

    /// Add an allowlist entry. A trailing `*` marks a prefix match.
    pub fn add_public(&mut self, method: MethodSelector, path: &str) {
        self.public.push(PublicRoute {
            method,
            path: path.trim_end_matches('*').to_string(),
        });
    }

    /// Whether `method` and `path` bypass authentication.
    #[must_use]
    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.public.iter().any(|route| route.matches(method, path))
    }

    /// Find the upstream and forwarded path for a request, if any.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute<'_>> {
        let route = self
            .routes
            .iter()
            .find(|route| path.starts_with(&route.prefix))?;
        let tail = &path[route.prefix.len()..];

        let forwarded = match route.rules.iter().find(|rule| rule.matches(method, tail)) {
            Some(rule) => rule.replacement.clone(),
            None => match &route.strip {
                Some(strip) => strip.apply(path),
                None => path.to_string(),
            },
        };

        Some(ResolvedRoute {
            upstream_base: &route.upstream_base,
            path: forwarded,
        })
    }

    /// Registered upstream prefixes in resolution order.
    #[must_use]
    pub fn routes(&self) -> &[ServiceRoute] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH: &str = "http://auth:8000";
    const AGENDA: &str = "http://agenda:8000";

    fn registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        registry
            .register(
                "/api/v1/auth",
                AUTH,
                vec![RewriteRule::new(Method::POST, "^/users/", "/api/v1/users/register").unwrap()],
                None,
            )
            .unwrap();
        registry
            .register(
                "/api/v1/agenda",
                AGENDA,
                Vec::new(),
                Some(StripRule::Literal("/agenda".into())),
            )
            .unwrap();
        registry
    }

    #[test]
    fn rewrite_rule_replaces_path() {
        let registry = registry();
        let resolved = registry
            .resolve(&Method::POST, "/api/v1/auth/users/anything")
            .unwrap();
        assert_eq!(resolved.upstream_base, AUTH);
        assert_eq!(resolved.path, "/api/v1/users/register");
        assert_eq!(resolved.target(), "http://auth:8000/api/v1/users/register");
    }

    #[test]
    fn rule_method_must_match() {
        let registry = registry();
        let resolved = registry
            .resolve(&Method::GET, "/api/v1/auth/users/anything")
            .unwrap();
        assert_eq!(resolved.path, "/api/v1/auth/users/anything");
    }

    #[test]
    fn unanchored_rule_matches_only_at_tail_start() {
        let mut registry = RouteRegistry::new();
        registry
            .register(
                "/api/v1/auth",
                AUTH,
                vec![RewriteRule::new(Method::POST, "/users/", "/api/v1/users/register").unwrap()],
                None,
            )
            .unwrap();

        let resolved = registry
            .resolve(&Method::POST, "/api/v1/auth/sessions/users/x")
            .unwrap();
        assert_eq!(resolved.path, "/api/v1/auth/sessions/users/x");

        let resolved = registry
            .resolve(&Method::POST, "/api/v1/auth/users/x")
            .unwrap();
        assert_eq!(resolved.path, "/api/v1/users/register");
    }

    #[test]
    fn strip_removes_one_occurrence() {
        let registry = registry();
        let resolved = registry
            .resolve(&Method::GET, "/api/v1/agenda/calendars")
            .unwrap();
        assert_eq!(resolved.upstream_base, AGENDA);
        assert_eq!(resolved.path, "/api/v1/calendars");

        let resolved = registry
            .resolve(&Method::GET, "/api/v1/agenda/agenda/items")
            .unwrap();
        assert_eq!(resolved.path, "/api/v1/agenda/items");
    }

    #[test]
    fn pattern_strip_applies_to_full_path() {
        let mut registry = RouteRegistry::new();
        registry
            .register(
                "/api/v2/plans",
                AGENDA,
                Vec::new(),
                Some(StripRule::pattern(r"/v\d").unwrap()),
            )
            .unwrap();
        let resolved = registry.resolve(&Method::GET, "/api/v2/plans/v3").unwrap();
        assert_eq!(resolved.path, "/api/plans/v3");
    }

    #[test]
    fn unmatched_path_resolves_to_nothing() {
        assert!(registry().resolve(&Method::GET, "/api/v1/chats").is_none());
    }

    #[test]
    fn duplicate_prefix_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register("/api/v1/auth", "http://other", Vec::new(), None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePrefix(prefix) if prefix == "/api/v1/auth"));
    }

    #[test]
    fn first_registered_prefix_wins() {
        let mut registry = RouteRegistry::new();
        registry.register("/api/v1", "http://first", Vec::new(), None).unwrap();
        registry.register("/api/v1/auth", "http://second", Vec::new(), None).unwrap();

        let resolved = registry.resolve(&Method::GET, "/api/v1/auth/sessions").unwrap();
        assert_eq!(resolved.upstream_base, "http://first");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(matches!(
            RewriteRule::new(Method::GET, "([", "/x"),
            Err(RegistryError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn public_routes() {
        let mut registry = RouteRegistry::new();
        registry.add_public(MethodSelector::Any, "/docs");
        registry.add_public(MethodSelector::Exact(Method::GET), "/api/health/*");
        registry.add_public(MethodSelector::Exact(Method::POST), "/api/v1/auth/sessions");

        assert!(registry.is_public(&Method::DELETE, "/docs"));
        assert!(registry.is_public(&Method::GET, "/api/health/ping"));
        assert!(!registry.is_public(&Method::POST, "/api/health/ping"));
        assert!(registry.is_public(&Method::POST, "/api/v1/auth/sessions"));
        assert!(!registry.is_public(&Method::DELETE, "/api/v1/auth/sessions"));
        assert!(!registry.is_public(&Method::GET, "/api/v1/chats"));
    }
}
