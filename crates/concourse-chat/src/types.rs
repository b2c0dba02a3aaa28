//! Request and response types for chat operations.

use serde::{Deserialize, Serialize};

use concourse_core::{ChatId, UserId};
use concourse_store::ChatRole;

/// Request to create a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    /// Owner of the chat. Defaults to the caller when omitted.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Optional display title.
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to update a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChatRequest {
    /// New display title. `None` leaves the title unchanged.
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to create a message in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    /// Author role.
    #[serde(default = "CreateMessageRequest::default_role")]
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl CreateMessageRequest {
    const fn default_role() -> ChatRole {
        ChatRole::User
    }
}

/// Request to update a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMessageRequest {
    /// New role. `None` leaves the role unchanged.
    #[serde(default)]
    pub role: Option<ChatRole>,
    /// New text. `None` leaves the content unchanged.
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of a chat exchange request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Chat the exchange belongs to; must match the path.
    pub chat_id: ChatId,
    /// The user's message text.
    pub message: String,
}

/// Offset pagination parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    /// Number of items to skip.
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of items to return.
    #[serde(default = "PageParams::default_limit")]
    pub limit: usize,
}

impl PageParams {
    /// Largest page a caller may request.
    pub const MAX_LIMIT: usize = 100;

    const fn default_limit() -> usize {
        20
    }

    /// The limit clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn clamped_limit(&self) -> usize {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::default_limit(),
        }
    }
}

/// One page of results with the total count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: usize,
    /// Limit used for this page.
    pub limit: usize,
    /// Offset used for this page.
    pub offset: usize,
}

/// Configuration for the chat domain.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Reply generator used by the exchange workflow.
    #[serde(default = "ChatConfig::default_agent")]
    pub default_agent: String,
}

impl ChatConfig {
    fn default_agent() -> String {
        "agenda".to_string()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_agent: Self::default_agent(),
        }
    }
}
