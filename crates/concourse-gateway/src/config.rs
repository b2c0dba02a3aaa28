//! Gateway configuration types.
//!
//! This module defines configuration structures for the gateway and the
//! upstream services it forwards to.

use std::time::Duration;

use serde::Deserialize;

use concourse_chat::ChatConfig;
use concourse_core::RunMode;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Prefix every local endpoint is mounted under.
    #[serde(default = "GatewayConfig::default_api_prefix")]
    pub api_prefix: String,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Environment the process runs in.
    #[serde(default)]
    pub mode: RunMode,

    /// Expose error details even in production.
    #[serde(default)]
    pub debug: bool,

    /// Upstream service addresses.
    #[serde(default)]
    pub upstreams: UpstreamsConfig,

    /// Chat exchange settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_api_prefix() -> String {
        "/api".to_string()
    }

    const fn default_max_body() -> usize {
        10 * 1024 * 1024 // 10 MB
    }

    const fn default_request_timeout() -> u64 {
        60
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Whether error responses carry their `details` field.
    #[must_use]
    pub const fn expose_error_details(&self) -> bool {
        self.debug || !self.mode.is_prod()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            api_prefix: Self::default_api_prefix(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            mode: RunMode::default(),
            debug: false,
            upstreams: UpstreamsConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Base addresses of the upstream services.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamsConfig {
    /// Authorization service.
    #[serde(default = "UpstreamsConfig::default_auth_url")]
    pub auth_url: String,
    /// Agenda and calendar service.
    #[serde(default = "UpstreamsConfig::default_agenda_url")]
    pub agenda_url: String,
    /// Snapshot (ML) service.
    #[serde(default = "UpstreamsConfig::default_snapshot_url")]
    pub snapshot_url: String,
}

impl UpstreamsConfig {
    fn default_auth_url() -> String {
        "http://localhost:8001".to_string()
    }

    fn default_agenda_url() -> String {
        "http://localhost:8002".to_string()
    }

    fn default_snapshot_url() -> String {
        "http://localhost:8003".to_string()
    }
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            auth_url: Self::default_auth_url(),
            agenda_url: Self::default_agenda_url(),
            snapshot_url: Self::default_snapshot_url(),
        }
    }
}
