//! Reply generators and their startup registry.
//!
//! Generators are registered explicitly when the process starts. The
//! registry rejects unnamed or duplicate generators before any traffic is
//! accepted and is read-only afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use concourse_core::{ChatId, DependencyHealth, DependencyType, HealthStatus};
use concourse_http::{Method, OutboundClient, OutboundRequest};

use crate::error::{ChatError, Result};

/// A backend able to produce assistant replies.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Registry name of this generator. Must be non-empty.
    fn name(&self) -> &str;

    /// Produce a reply to `message` within chat `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Generation` if the backend call fails.
    async fn generate(&self, chat_id: ChatId, message: &str) -> Result<String>;

    /// Report the backend's health with optional diagnostic details.
    ///
    /// # Errors
    ///
    /// Any error is reported as an `ERROR` dependency by the registry.
    async fn health_check(&self) -> Result<(HealthStatus, Option<Value>)>;
}

/// Name-indexed table of reply generators, in registration order.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: Vec<(String, Arc<dyn ReplyGenerator>)>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}

impl AgentRegistry {
    /// Build the registry, validating every generator's name.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidAgent` if a name is empty or two names
    /// collide after lowercasing.
    pub fn build(generators: Vec<Arc<dyn ReplyGenerator>>) -> Result<Self> {
        let mut agents: Vec<(String, Arc<dyn ReplyGenerator>)> = Vec::with_capacity(generators.len());

        for generator in generators {
            let key = generator.name().trim().to_lowercase();
            if key.is_empty() {
                return Err(ChatError::InvalidAgent(
                    "reply generator has an empty name".to_string(),
                ));
            }
            if agents.iter().any(|(existing, _)| *existing == key) {
                return Err(ChatError::InvalidAgent(format!(
                    "reply generator '{key}' is registered twice"
                )));
            }
            tracing::info!(agent = %key, "Registered reply generator");
            agents.push((key, generator));
        }

        Ok(Self { agents })
    }

    /// Look up a generator by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::UnsupportedAgent` if no generator has that name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ReplyGenerator>> {
        let key = name.to_lowercase();
        self.agents
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, generator)| Arc::clone(generator))
            .ok_or_else(|| ChatError::UnsupportedAgent(name.to_string()))
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Health of every generator, or only of those named in `only`.
    pub async fn ping_agents(&self, only: Option<&[&str]>) -> Vec<DependencyHealth> {
        let mut results = Vec::new();

        for (name, generator) in &self.agents {
            if let Some(only) = only {
                if !only.iter().any(|wanted| wanted.eq_ignore_ascii_case(name)) {
                    continue;
                }
            }

            let dep_name = format!("Agent: {name}");
            let health = match generator.health_check().await {
                Ok((status, details)) => DependencyHealth {
                    name: dep_name,
                    status,
                    kind: DependencyType::Http,
                    details,
                },
                Err(e) => {
                    tracing::error!(agent = %name, error = %e, "Reply generator health check failed");
                    DependencyHealth::failed(dep_name, DependencyType::Http, e)
                }
            };
            results.push(health);
        }

        results
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    chat_id: ChatId,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    reply: String,
}

/// Reply generator reached over HTTP.
///
/// Replies come from `POST {base}/v1/generate`; health from
/// `GET {base}/api/health/ping`.
pub struct HttpReplyGenerator {
    name: String,
    base_url: String,
    client: Arc<OutboundClient>,
}

impl HttpReplyGenerator {
    /// Create a generator named `name` served at `base_url`.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, client: Arc<OutboundClient>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl ReplyGenerator for HttpReplyGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, chat_id: ChatId, message: &str) -> Result<String> {
        let generation_failed = |source| ChatError::Generation {
            agent: self.name.clone(),
            source,
        };

        let request = OutboundRequest::new(Method::POST, format!("{}/v1/generate", self.base_url))
            .json(&GenerateRequest { chat_id, message })
            .map_err(generation_failed)?;

        let response: GenerateResponse = self
            .client
            .make_json_request(request)
            .await
            .map_err(generation_failed)?;

        Ok(response.reply)
    }

    async fn health_check(&self) -> Result<(HealthStatus, Option<Value>)> {
        let request =
            OutboundRequest::new(Method::GET, format!("{}/api/health/ping", self.base_url));
        self.client.make_request(request).await?;
        Ok((HealthStatus::Ok, None))
    }
}

/// A canned reply generator for tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct StaticAgent {
    name: String,
    reply: String,
    healthy: bool,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticAgent {
    /// A healthy agent that always answers `reply`.
    #[must_use]
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
            healthy: true,
        }
    }

    /// An agent whose health check always fails.
    #[must_use]
    pub fn unhealthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: String::new(),
            healthy: false,
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl ReplyGenerator for StaticAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _chat_id: ChatId, _message: &str) -> Result<String> {
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<(HealthStatus, Option<Value>)> {
        if self.healthy {
            Ok((HealthStatus::Ok, None))
        } else {
            Err(ChatError::Upstream(concourse_http::HttpError::Transport(
                "connection refused".to_string(),
            )))
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

    fn agent(name: &str) -> Arc<dyn ReplyGenerator> {
        Arc::new(StaticAgent::new(name, "ok"))
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = AgentRegistry::build(vec![agent("Agenda")]).unwrap();
        assert_eq!(registry.get("AGENDA").unwrap().name(), "Agenda");
        assert_eq!(registry.names(), vec!["agenda"]);
    }

    #[test]
    fn unknown_agent_is_unsupported() {
        let registry = AgentRegistry::build(vec![agent("agenda")]).unwrap();
        assert!(matches!(
            registry.get("coach"),
            Err(ChatError::UnsupportedAgent(name)) if name == "coach"
        ));
    }

    #[test]
    fn empty_and_duplicate_names_are_rejected() {
        assert!(matches!(
            AgentRegistry::build(vec![agent("  ")]),
            Err(ChatError::InvalidAgent(_))
        ));
        assert!(matches!(
            AgentRegistry::build(vec![agent("agenda"), agent("AGENDA")]),
            Err(ChatError::InvalidAgent(_))
        ));
    }

    #[tokio::test]
    async fn ping_reports_every_agent_in_order() {
        let registry = AgentRegistry::build(vec![
            agent("agenda"),
            Arc::new(StaticAgent::unhealthy("coach")),
        ])
        .unwrap();

        let health = registry.ping_agents(None).await;
        assert_eq!(health.len(), 2);
        assert_eq!(health[0].name, "Agent: agenda");
        assert_eq!(health[0].status, HealthStatus::Ok);
        assert_eq!(health[1].name, "Agent: coach");
        assert_eq!(health[1].status, HealthStatus::Error);
        assert!(health[1].details.as_ref().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn ping_can_be_filtered() {
        let registry = AgentRegistry::build(vec![agent("agenda"), agent("coach")]).unwrap();
        let health = registry.ping_agents(Some(&["Coach"][..])).await;
        assert_eq!(health.len(), 1);
        assert_eq!(health[0].name, "Agent: coach");
    }

    #[tokio::test]
    async fn http_generator_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .and(body_json(json!({"chat_id": 4, "message": "plan my week"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Sure."})))
            .expect(1)
            .mount(&server)
            .await;

        let client = Arc::new(OutboundClient::new(OutboundConfig::default()).unwrap());
        let generator = HttpReplyGenerator::new("agenda", server.uri(), client);
        let reply = generator
            .generate(ChatId::new(4), "plan my week")
            .await
            .unwrap();
        assert_eq!(reply, "Sure.");
    }

    #[tokio::test]
    async fn http_generator_failure_names_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Arc::new(OutboundClient::new(OutboundConfig::default()).unwrap());
        let generator = HttpReplyGenerator::new("agenda", server.uri(), client);
        let err = generator.generate(ChatId::new(1), "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Generation { ref agent, .. } if agent == "agenda"));
        assert_eq!(err.http_status_code(), 503);
    }
}
