//! Caller authentication for concourse.
//!
//! This crate verifies access credentials and resolves callers to their
//! canonical identity:
//!
//! - Local token verification against a configured public key
//! - Profile lookup at the authorization service, forwarding the caller's cookies
//! - Role-group checks layered on top of the resolved identity
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│   AuthService    │
//! │   (auth gate)    │     │                  │
//! └──────────────────┘     └───┬──────────┬───┘
//!                              │          │
//!                 ┌────────────▼───┐  ┌───▼──────────────┐
//!                 │  JwtValidator  │  │  IdentityClient  │
//!                 │  (local key)   │  │  (users/me)      │
//!                 └────────────────┘  └───┬──────────────┘
//!                                         │ HTTP
//!                                  ┌──────▼───────────┐
//!                                  │  Authorization   │
//!                                  │  service         │
//!                                  └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use concourse_auth::{AuthConfig, AuthService, IdentityClient, PublicKeyValidator};
//! use concourse_http::{OutboundClient, OutboundConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::default();
//! let client = Arc::new(OutboundClient::new(OutboundConfig::default())?);
//!
//! let validator = Arc::new(PublicKeyValidator::new(&config)?);
//! let identity = IdentityClient::new(client, &config.base_url);
//! let auth = AuthService::new(validator, identity, &config.access_cookie);
//!
//! // In a request handler:
//! let user = auth.authenticate(Some("access_token=eyJhbGciOi...")).await?;
//! println!("User {} has role {}", user.id, user.role);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod identity;
pub mod jwt;
pub mod service;

use serde::Deserialize;

pub use error::{AuthError, Result};
pub use identity::{IdentityClient, UserProfile};
pub use jwt::{JwtValidator, PublicKeyValidator, TokenClaims};
pub use service::{cookie_value, require_role, AuthService};

#[cfg(any(test, feature = "test-utils"))]
pub use jwt::MockJwtValidator;

/// Configuration for caller authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the authorization service.
    #[serde(default = "AuthConfig::default_base_url")]
    pub base_url: String,
    /// PEM-encoded verification key, or the shared secret for HMAC algorithms.
    #[serde(default)]
    pub public_key_pem: String,
    /// Token signing algorithm name (e.g. `RS256`).
    #[serde(default = "AuthConfig::default_algorithm")]
    pub algorithm: String,
    /// Name of the cookie carrying the access token.
    #[serde(default = "AuthConfig::default_access_cookie")]
    pub access_cookie: String,
}

impl AuthConfig {
    fn default_base_url() -> String {
        "http://localhost:8001".to_string()
    }

    fn default_algorithm() -> String {
        "RS256".to_string()
    }

    fn default_access_cookie() -> String {
        "access_token".to_string()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            public_key_pem: String::new(),
            algorithm: Self::default_algorithm(),
            access_cookie: Self::default_access_cookie(),
        }
    }
}
