//! Domain types stored in the database.
//!
//! These types represent the persisted state of chats and their messages.

use chrono::{DateTime, Utc};
use concourse_core::{ChatId, MessageId, UserId};
use serde::{Deserialize, Serialize};

/// A chat record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique identifier for the chat.
    pub chat_id: ChatId,
    /// User the chat belongs to.
    pub user_id: UserId,
    /// Optional display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Written by the human user.
    User,
    /// Generated by an AI reply generator.
    Assistant,
    /// Injected instructions.
    System,
}

/// A message record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message.
    pub message_id: MessageId,
    /// Chat this message belongs to. Never changes after creation.
    pub chat_id: ChatId,
    /// Author of the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Named id counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Chat ids.
    Chats,
    /// Message ids.
    Messages,
}

impl Sequence {
    /// Key under which the counter is stored.
    #[must_use]
    pub const fn key(self) -> &'static [u8] {
        match self {
            Self::Chats => b"chats",
            Self::Messages => b"messages",
        }
    }
}

