//! Chat domain for concourse.
//!
//! This crate owns the locally stored chats and messages and the workflow
//! that answers a user's message with an AI-generated reply.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway handlers                        │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                          │
//!                  ▼                          ▼
//! ┌───────────────────────────┐  ┌──────────────────────────────┐
//! │     ChatPlaneService      │◀─│         ChatExchange         │
//! │  chat + message CRUD      │  │ snapshot → store → generate  │
//! └───────────────────────────┘  └──────────────────────────────┘
//!                  │                   │                │
//!                  ▼                   ▼                ▼
//!           ┌──────────┐      ┌────────────────┐ ┌────────────┐
//!           │  Store   │      │ SnapshotClient │ │ Agent      │
//!           │ (RocksDB)│      │                │ │ Registry   │
//!           └──────────┘      └────────────────┘ └────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use concourse_chat::{ChatPlaneService, ChatService};
//! use concourse_core::UserId;
//! use concourse_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/concourse")?);
//! let chats = ChatPlaneService::new(store);
//!
//! let chat = chats.create_chat(UserId::new(1), Some("Weekly plan".into())).await?;
//! println!("Created chat: {}", chat.chat_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod agents;
pub mod error;
pub mod exchange;
pub mod service;
pub mod snapshot;
pub mod types;

pub use agents::{AgentRegistry, HttpReplyGenerator, ReplyGenerator};
pub use error::{ChatError, Result};
pub use exchange::ChatExchange;
pub use service::{ChatPlaneService, ChatService};
pub use snapshot::SnapshotClient;
pub use types::{
    ChatConfig, CreateChatRequest, CreateMessageRequest, ExchangeRequest, Page, PageParams,
    UpdateChatRequest, UpdateMessageRequest,
};

#[cfg(any(test, feature = "test-utils"))]
pub use agents::StaticAgent;

// Re-export commonly used types from dependencies for convenience
pub use concourse_core::{ChatId, MessageId, UserId};
pub use concourse_store::{Chat, ChatRole, Message};
