//! Public HTTP gateway for the concourse platform.
//!
//! Every request passes one pipeline before it reaches a handler:
//!
//! - the auth gate lets public routes through and authenticates the rest
//!   from the access-token cookie
//! - the reverse proxy forwards requests under a registered prefix to their
//!   upstream service, relaying upstream errors as-is
//! - the resulting user and upstream answer are frozen into a
//!   [`RequestContext`] that handlers extract
//!
//! Chats and messages are served from a local store; sessions, users and the
//! agenda are thin handlers over proxied answers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Clients                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    concourse-gateway                        │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Auth gate  │▶│  Reverse    │▶│  Router + Handlers  │    │
//! │  │             │ │  proxy      │ │                     │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!          │               │                     │
//!          ▼               ▼                     ▼
//!    ┌──────────┐  ┌──────────────┐  ┌────────────────────┐
//!    │  Auth    │  │ Agenda /     │  │ Chat store, reply  │
//!    │ service  │  │ Snapshot     │  │ generators         │
//!    └──────────┘  └──────────────┘  └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use concourse_auth::{AuthConfig, AuthService, IdentityClient, PublicKeyValidator};
//! use concourse_chat::{AgentRegistry, ChatPlaneService, SnapshotClient};
//! use concourse_gateway::{build_registry, create_router, GatewayConfig, GatewayState};
//! use concourse_http::{OutboundClient, OutboundConfig};
//! use concourse_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default();
//! let client = Arc::new(OutboundClient::new(OutboundConfig::default())?);
//! let registry = build_registry(&config.upstreams)?;
//!
//! let auth_config = AuthConfig::default();
//! let validator = Arc::new(PublicKeyValidator::new(&auth_config)?);
//! let identity = IdentityClient::new(Arc::clone(&client), &config.upstreams.auth_url);
//! let auth = AuthService::new(validator, identity, &auth_config.access_cookie);
//!
//! let store = Arc::new(RocksStore::open("/tmp/concourse")?);
//! let chats = Arc::new(ChatPlaneService::new(store));
//! let agents = AgentRegistry::build(Vec::new())?;
//! let snapshot = SnapshotClient::new(Arc::clone(&client), &config.upstreams.snapshot_url);
//!
//! let state = GatewayState::new(config, registry, client, auth, chats, agents, snapshot);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(
//!     listener,
//!     app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod context;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod pipeline;
pub mod registry;
pub mod routes;
pub mod state;

pub use catalog::build_registry;
pub use config::GatewayConfig;
pub use context::RequestContext;
pub use error::ApiError;
pub use registry::RouteRegistry;
pub use routes::create_router;
pub use state::GatewayState;
