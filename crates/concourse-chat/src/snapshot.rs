//! Client for the snapshot (analysis) service.

use std::sync::Arc;

use serde::Serialize;

use concourse_core::UserId;
use concourse_http::{Method, OutboundClient, OutboundRequest};

use crate::error::Result;

#[derive(Debug, Serialize)]
struct CaptureRequest<'a> {
    user_id: UserId,
    message: &'a str,
}

/// Sends user messages to the snapshot service for analysis.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    client: Arc<OutboundClient>,
    base_url: String,
}

impl SnapshotClient {
    /// Create a client for the snapshot service at `base_url`.
    #[must_use]
    pub fn new(client: Arc<OutboundClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Lightweight liveness check of the snapshot service.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Upstream` on any failure.
    pub async fn ping(&self) -> Result<()> {
        let request =
            OutboundRequest::new(Method::GET, format!("{}/api/health/ping", self.base_url));
        self.client.make_request(request).await?;
        Ok(())
    }

    /// Submit a user message for analysis.
    ///
    /// Failures never reach the caller; they are logged and dropped.
    pub async fn capture(&self, user_id: UserId, message: &str) {
        let url = format!("{}/v1/snapshot", self.base_url);
        let request = match OutboundRequest::new(Method::POST, url)
            .json(&CaptureRequest { user_id, message })
        {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Snapshot request could not be built");
                return;
            }
        };

        if let Err(e) = self.client.make_request(request).await {
            tracing::warn!(user_id = %user_id, error = %e, "Snapshot service failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concourse_http::OutboundConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot(server: &MockServer) -> SnapshotClient {
        let client = Arc::new(OutboundClient::new(OutboundConfig::default()).unwrap());
        SnapshotClient::new(client, server.uri())
    }

    #[tokio::test]
    async fn capture_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/snapshot"))
            .and(body_json(json!({"user_id": 3, "message": "tired today"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        snapshot(&server).capture(UserId::new(3), "tired today").await;
    }

    #[tokio::test]
    async fn capture_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        snapshot(&server).capture(UserId::new(3), "hello").await;
    }

    #[tokio::test]
    async fn ping_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health/ping"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(snapshot(&server).ping().await.is_err());
    }
}
