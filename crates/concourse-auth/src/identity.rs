//! Identity resolution against the authorization service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use concourse_core::{Role, UserId};
use concourse_http::{Method, OutboundClient, OutboundRequest};

use crate::error::Result;

/// Fields of the profile that are never exposed to API callers.
const PRIVATE_FIELDS: [&str; 3] = ["active_sessions", "created_at", "updated_at"];

/// The canonical identity of a caller, as returned by `/api/v1/users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Current role.
    pub role: Role,
    /// Whether the account may be used.
    #[serde(default = "UserProfile::default_active")]
    pub is_active: bool,
    /// Every other field reported by the authorization service.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    const fn default_active() -> bool {
        true
    }

    /// The profile as exposed to API callers, without session bookkeeping.
    #[must_use]
    pub fn public_view(&self) -> Value {
        let mut view = self.clone();
        for field in PRIVATE_FIELDS {
            view.extra.remove(field);
        }
        serde_json::to_value(view).unwrap_or(Value::Null)
    }
}

/// Client for the authorization service's identity endpoints.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Arc<OutboundClient>,
    base_url: String,
}

impl IdentityClient {
    /// Create a client for the authorization service at `base_url`.
    #[must_use]
    pub fn new(client: Arc<OutboundClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL of the authorization service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the profile of the caller owning `cookie_header`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Upstream` if the call fails or the body does not
    /// decode into a profile.
    pub async fn current_user(&self, cookie_header: &str) -> Result<UserProfile> {
        let request = OutboundRequest::new(
            Method::GET,
            format!("{}/api/v1/users/me", self.base_url),
        )
        .cookies(cookie_header)?;

        Ok(self.client.make_json_request(request).await?)
    }

    /// Lightweight liveness check of the authorization service.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Upstream` on any failure.
    pub async fn ping(&self) -> Result<()> {
        let request =
            OutboundRequest::new(Method::GET, format!("{}/api/health/ping", self.base_url));
        self.client.make_request(request).await?;
        Ok(())
    }
}
