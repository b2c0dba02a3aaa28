//! The "user speaks, assistant answers" workflow.

use std::sync::Arc;

use concourse_core::{ChatId, UserId};
use concourse_store::{ChatRole, Message};

use crate::agents::AgentRegistry;
use crate::error::Result;
use crate::service::ChatService;
use crate::snapshot::SnapshotClient;

/// Orchestrates one exchange: snapshot, user message, reply, assistant message.
pub struct ChatExchange<C: ChatService> {
    chats: Arc<C>,
    agents: Arc<AgentRegistry>,
    snapshot: SnapshotClient,
    default_agent: String,
}

impl<C: ChatService> ChatExchange<C> {
    /// Create the workflow, replying with the agent named `default_agent`.
    #[must_use]
    pub fn new(
        chats: Arc<C>,
        agents: Arc<AgentRegistry>,
        snapshot: SnapshotClient,
        default_agent: impl Into<String>,
    ) -> Self {
        Self {
            chats,
            agents,
            snapshot,
            default_agent: default_agent.into(),
        }
    }

    /// Run one exchange and return `[user_message, assistant_message]`.
    ///
    /// # Errors
    ///
    /// - `ChatError::ChatNotFound` if the chat doesn't exist
    /// - `ChatError::UnsupportedAgent` if the default agent is not registered
    /// - `ChatError::Generation` if the agent fails; the user message stays stored
    pub async fn exchange(&self, user_id: UserId, chat_id: ChatId, text: &str) -> Result<[Message; 2]> {
        self.snapshot.capture(user_id, text).await;

        let generator = self.agents.get(&self.default_agent)?;

        let user_message = self
            .chats
            .create_message(chat_id, ChatRole::User, text.to_string())
            .await?;

        let reply = generator.generate(chat_id, text).await?;

        let assistant_message = self
            .chats
            .create_message(chat_id, ChatRole::Assistant, reply)
            .await?;

        tracing::info!(
            chat_id = %chat_id,
            user_id = %user_id,
            agent = %generator.name(),
            "Chat exchange completed"
        );

        Ok([user_message, assistant_message])
    }
}
