//! Gateway application state.
//!
//! This module defines the shared state that is available to the pipeline
//! stages and all request handlers. Everything in it is built once at
//! startup and never mutated afterwards.

use std::sync::Arc;

use concourse_auth::{AuthService, JwtValidator};
use concourse_chat::{AgentRegistry, ChatExchange, ChatService, SnapshotClient};
use concourse_http::OutboundClient;

use crate::config::GatewayConfig;
use crate::registry::RouteRegistry;

/// Shared application state for the gateway.
pub struct GatewayState<C, V>
where
    C: ChatService,
    V: JwtValidator,
{
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Upstream prefixes and public allowlist.
    pub registry: Arc<RouteRegistry>,
    /// Pooled client used for proxied calls.
    pub client: Arc<OutboundClient>,
    /// Caller authentication.
    pub auth: Arc<AuthService<V>>,
    /// Chat and message operations.
    pub chats: Arc<C>,
    /// Reply generators.
    pub agents: Arc<AgentRegistry>,
    /// Snapshot service client.
    pub snapshot: SnapshotClient,
    /// The message exchange workflow.
    pub exchange: Arc<ChatExchange<C>>,
}

impl<C, V> GatewayState<C, V>
where
    C: ChatService,
    V: JwtValidator,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        registry: RouteRegistry,
        client: Arc<OutboundClient>,
        auth: AuthService<V>,
        chats: Arc<C>,
        agents: AgentRegistry,
        snapshot: SnapshotClient,
    ) -> Self {
        let agents = Arc::new(agents);
        let exchange = Arc::new(ChatExchange::new(
            Arc::clone(&chats),
            Arc::clone(&agents),
            snapshot.clone(),
            config.chat.default_agent.clone(),
        ));

        Self {
            config,
            registry: Arc::new(registry),
            client,
            auth: Arc::new(auth),
            chats,
            agents,
            snapshot,
            exchange,
        }
    }
}

impl<C, V> Clone for GatewayState<C, V>
where
    C: ChatService,
    V: JwtValidator,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: Arc::clone(&self.registry),
            client: Arc::clone(&self.client),
            auth: Arc::clone(&self.auth),
            chats: Arc::clone(&self.chats),
            agents: Arc::clone(&self.agents),
            snapshot: self.snapshot.clone(),
            exchange: Arc::clone(&self.exchange),
        }
    }
}

/// State wired to a temporary store, mock token validation and caller-chosen
/// upstreams.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    use concourse_auth::{IdentityClient, MockJwtValidator};
    use concourse_chat::{ChatPlaneService, ReplyGenerator, StaticAgent};
    use concourse_http::OutboundConfig;
    use concourse_store::RocksStore;
    use tempfile::TempDir;

    use crate::catalog::build_registry;
    use crate::config::UpstreamsConfig;

    pub(crate) type TestChats = ChatPlaneService<RocksStore>;
    pub(crate) type TestState = GatewayState<TestChats, MockJwtValidator>;

    /// Cookie header accepted by the mock validator for subject `sub`.
    pub(crate) fn session_cookie(sub: &str) -> String {
        format!("access_token=test-token:{sub}")
    }

    pub(crate) fn test_state(upstream: &str) -> (TestState, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());

        let config = GatewayConfig {
            upstreams: UpstreamsConfig {
                auth_url: upstream.to_string(),
                agenda_url: upstream.to_string(),
                snapshot_url: upstream.to_string(),
            },
            ..GatewayConfig::default()
        };
        let client = Arc::new(
            OutboundClient::new(OutboundConfig {
                max_attempts: 1,
                ..OutboundConfig::default()
            })
            .unwrap(),
        );

        let registry = build_registry(&config.upstreams).unwrap();
        let identity = IdentityClient::new(Arc::clone(&client), upstream);
        let auth = AuthService::new(Arc::new(MockJwtValidator), identity, "access_token");
        let chats = Arc::new(ChatPlaneService::new(store));
        let agent: Arc<dyn ReplyGenerator> = Arc::new(StaticAgent::new("agenda", "Noted."));
        let agents = AgentRegistry::build(vec![agent]).unwrap();
        let snapshot = SnapshotClient::new(Arc::clone(&client), upstream);

        let state = GatewayState::new(config, registry, client, auth, chats, agents, snapshot);
        (state, dir)
    }
}
