//! Outbound client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the pooled outbound client.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundConfig {
    /// Maximum concurrent outbound calls and idle keep-alive connections per host.
    #[serde(default = "OutboundConfig::default_max_connections")]
    pub max_connections: usize,

    /// Per-call timeout in milliseconds, covering the wait for a pool slot.
    #[serde(default = "OutboundConfig::default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection establishment timeout in milliseconds.
    #[serde(default = "OutboundConfig::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Total attempts on the validating path before giving up on timeouts.
    #[serde(default = "OutboundConfig::default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds. Doubles per attempt.
    #[serde(default = "OutboundConfig::default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single retry delay, in milliseconds.
    #[serde(default = "OutboundConfig::default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl OutboundConfig {
    const fn default_max_connections() -> usize {
        100
    }

    const fn default_timeout_ms() -> u64 {
        30_000
    }

    const fn default_connect_timeout_ms() -> u64 {
        5_000
    }

    const fn default_max_attempts() -> u32 {
        3
    }

    const fn default_backoff_base_ms() -> u64 {
        2_000
    }

    const fn default_backoff_max_ms() -> u64 {
        30_000
    }

    /// Get the per-call timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            max_connections: Self::default_max_connections(),
            timeout_ms: Self::default_timeout_ms(),
            connect_timeout_ms: Self::default_connect_timeout_ms(),
            max_attempts: Self::default_max_attempts(),
            backoff_base_ms: Self::default_backoff_base_ms(),
            backoff_max_ms: Self::default_backoff_max_ms(),
        }
    }
}
