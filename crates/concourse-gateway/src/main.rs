//! Concourse Gateway - public HTTP entry point
//!
//! This is the main entry point for the gateway service. It authenticates
//! callers, forwards requests under the upstream prefixes and serves the chat
//! endpoints from a local store.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to use a mock JWT validator that accepts
//! any access token of the form `test-token:<user-id>`.
//!
//! # Agents
//!
//! `AI_AGENTS` is a comma-separated list of reply generator names. Each one
//! reads its base URL from `AGENT_<NAME>_URL`.

use std::error::Error;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "dev-mode")]
use concourse_auth::MockJwtValidator;
#[cfg(not(feature = "dev-mode"))]
use concourse_auth::PublicKeyValidator;
use concourse_auth::{AuthConfig, AuthService, IdentityClient};
use concourse_chat::{
    AgentRegistry, ChatConfig, ChatPlaneService, HttpReplyGenerator, ReplyGenerator,
    SnapshotClient,
};
use concourse_core::RunMode;
use concourse_gateway::config::UpstreamsConfig;
use concourse_gateway::{build_registry, create_router, GatewayConfig, GatewayState};
use concourse_http::{OutboundClient, OutboundConfig};
use concourse_store::RocksStore;

type BoxError = Box<dyn Error>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing();

    tracing::info!("Starting Concourse Gateway");

    // Load configuration from environment
    let data_dir = env_or("DATA_DIR", "/data/concourse");
    let defaults = GatewayConfig::default();
    let upstreams = UpstreamsConfig {
        auth_url: env_or("AUTH_SERVICE_URL", &defaults.upstreams.auth_url),
        agenda_url: env_or("AGENDA_SERVICE_URL", &defaults.upstreams.agenda_url),
        snapshot_url: env_or("SNAPSHOT_SERVICE_URL", &defaults.upstreams.snapshot_url),
    };
    let config = GatewayConfig {
        listen_addr: env_or("LISTEN_ADDR", &defaults.listen_addr),
        mode: env_parse("MODE", RunMode::default())?,
        debug: env_flag("DEBUG"),
        upstreams,
        chat: ChatConfig::default(),
        ..defaults
    };

    let outbound = OutboundConfig {
        max_connections: env_parse("HTTP_POOL_SIZE", OutboundConfig::default().max_connections)?,
        timeout_ms: env_parse::<u64>("HTTP_TIMEOUT_SECONDS", 30)? * 1000,
        ..OutboundConfig::default()
    };

    let auth_config = AuthConfig {
        base_url: config.upstreams.auth_url.clone(),
        public_key_pem: env_or("JWT_PUBLIC_KEY", ""),
        algorithm: env_or("JWT_ALGORITHM", "RS256"),
        access_cookie: env_or("AUTH_ACCESS_TOKEN_KEY", "access_token"),
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %data_dir,
        mode = ?config.mode,
        debug = config.debug,
        auth_url = %config.upstreams.auth_url,
        agenda_url = %config.upstreams.agenda_url,
        snapshot_url = %config.upstreams.snapshot_url,
        pool_size = outbound.max_connections,
        timeout_ms = outbound.timeout_ms,
        "Gateway configuration loaded"
    );

    // Shared outbound client
    let client = Arc::new(OutboundClient::new(outbound)?);

    // Route registry
    let registry = build_registry(&config.upstreams)?;

    // Chat store
    tracing::info!(path = %data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&data_dir)?);
    let chats = Arc::new(ChatPlaneService::new(store));

    // JWT validator
    #[cfg(feature = "dev-mode")]
    let jwt_validator = {
        tracing::warn!("DEV MODE ENABLED - using mock JWT validator");
        tracing::warn!("Use access tokens in format: test-token:<user-id>");
        Arc::new(MockJwtValidator)
    };

    #[cfg(not(feature = "dev-mode"))]
    let jwt_validator = Arc::new(PublicKeyValidator::new(&auth_config)?);
    tracing::info!(algorithm = %auth_config.algorithm, "JWT validator initialized");

    let identity = IdentityClient::new(Arc::clone(&client), &auth_config.base_url);
    let auth = AuthService::new(jwt_validator, identity, &auth_config.access_cookie);

    // Reply generators
    let agents = AgentRegistry::build(load_agents(&client))?;
    let snapshot = SnapshotClient::new(Arc::clone(&client), &config.upstreams.snapshot_url);

    let listen_addr = config.listen_addr.clone();
    let outbound_pool = Arc::clone(&client);
    let state = GatewayState::new(config, registry, client, auth, chats, agents, snapshot);
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    outbound_pool.close();
    tracing::info!("Gateway stopped");
    Ok(())
}

/// Install the global subscriber. `LOG_JSON` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,concourse=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if env_flag("LOG_JSON") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// One HTTP reply generator per name listed in `AI_AGENTS`.
fn load_agents(client: &Arc<OutboundClient>) -> Vec<Arc<dyn ReplyGenerator>> {
    let names = env_or("AI_AGENTS", "agenda");
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let key = format!("AGENT_{}_URL", name.to_ascii_uppercase());
            let url = env_or(&key, "http://localhost:8004");
            tracing::info!(agent = %name, url = %url, "Registering reply generator");
            let agent: Arc<dyn ReplyGenerator> =
                Arc::new(HttpReplyGenerator::new(name, url, Arc::clone(client)));
            agent
        })
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_parse<T>(key: &str, default: T) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("invalid {key}={raw}: {e}").into()),
        Err(_) => Ok(default),
    }
}
