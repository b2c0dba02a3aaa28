//! Chat and message service.
//!
//! This module provides the `ChatService` trait and the `ChatPlaneService`
//! implementation backed by a [`Store`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use concourse_core::{ChatId, MessageId, UserId};
use concourse_store::{Chat, ChatRole, Message, Sequence, Store, StoreError};

use crate::error::{ChatError, Result};
use crate::types::{Page, PageParams, UpdateChatRequest, UpdateMessageRequest};

/// Trait defining chat and message operations.
#[async_trait]
pub trait ChatService: Send + Sync {
    // =========================================================================
    // Chats
    // =========================================================================

    /// Create a chat owned by `user_id`.
    async fn create_chat(&self, user_id: UserId, title: Option<String>) -> Result<Chat>;

    /// Get a chat by id.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ChatNotFound` if the chat doesn't exist.
    async fn get_chat(&self, chat_id: ChatId) -> Result<Chat>;

    /// List chats.
    async fn list_chats(&self, params: PageParams) -> Result<Page<Chat>>;

    /// Apply an update to a chat.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ChatNotFound` if the chat doesn't exist.
    async fn update_chat(&self, chat_id: ChatId, update: UpdateChatRequest) -> Result<Chat>;

    /// Delete a chat and all of its messages.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ChatNotFound` if the chat doesn't exist.
    async fn delete_chat(&self, chat_id: ChatId) -> Result<()>;

    // =========================================================================
    // Messages
    // =========================================================================

    /// Append a message to a chat.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ChatNotFound` if the chat doesn't exist.
    async fn create_message(
        &self,
        chat_id: ChatId,
        role: ChatRole,
        content: String,
    ) -> Result<Message>;

    /// Get a message by id.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::MessageNotFound` if the message doesn't exist.
    async fn get_message(&self, message_id: MessageId) -> Result<Message>;

    /// List messages across all chats.
    async fn list_messages(&self, params: PageParams) -> Result<Page<Message>>;

    /// List the messages of one chat in creation order.
    async fn list_chat_messages(&self, chat_id: ChatId) -> Result<Vec<Message>>;

    /// Apply an update to a message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::MessageNotFound` if the message doesn't exist.
    async fn update_message(
        &self,
        message_id: MessageId,
        update: UpdateMessageRequest,
    ) -> Result<Message>;

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::MessageNotFound` if the message doesn't exist.
    async fn delete_message(&self, message_id: MessageId) -> Result<()>;

    // =========================================================================
    // Operational
    // =========================================================================

    /// Check that the backing store is usable.
    async fn ping(&self) -> Result<()>;
}

/// Store-backed chat service.
pub struct ChatPlaneService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ChatPlaneService<S> {
    /// Create a new chat service.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn page<T>(params: PageParams, (items, total): (Vec<T>, usize)) -> Page<T> {
        Page {
            items,
            total,
            limit: params.clamped_limit(),
            offset: params.offset,
        }
    }
}

#[async_trait]
impl<S: Store + 'static> ChatService for ChatPlaneService<S> {
    async fn create_chat(&self, user_id: UserId, title: Option<String>) -> Result<Chat> {
        let chat_id = ChatId::new(self.store.allocate_id(Sequence::Chats)?);
        let now = Utc::now();
        let chat = Chat {
            chat_id,
            user_id,
            title,
            created_at: now,
            updated_at: now,
        };
        self.store.put_chat(&chat)?;

        tracing::info!(chat_id = %chat_id, user_id = %user_id, "Chat created");
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: ChatId) -> Result<Chat> {
        self.store
            .get_chat(chat_id)?
            .ok_or(ChatError::ChatNotFound(chat_id))
    }

    async fn list_chats(&self, params: PageParams) -> Result<Page<Chat>> {
        let result = self
            .store
            .list_chats(params.offset, params.clamped_limit())?;
        Ok(Self::page(params, result))
    }

    async fn update_chat(&self, chat_id: ChatId, update: UpdateChatRequest) -> Result<Chat> {
        let mut chat = self.get_chat(chat_id).await?;
        if let Some(title) = update.title {
            chat.title = Some(title);
        }
        chat.updated_at = Utc::now();
        self.store.put_chat(&chat)?;
        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: ChatId) -> Result<()> {
        match self.store.delete_chat(chat_id) {
            Ok(()) => {
                tracing::info!(chat_id = %chat_id, "Chat deleted");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(ChatError::ChatNotFound(chat_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_message(
        &self,
        chat_id: ChatId,
        role: ChatRole,
        content: String,
    ) -> Result<Message> {
        let mut chat = self.get_chat(chat_id).await?;

        let message_id = MessageId::new(self.store.allocate_id(Sequence::Messages)?);
        let now = Utc::now();
        let message = Message {
            message_id,
            chat_id,
            role,
            content,
            created_at: now,
            updated_at: now,
        };
        self.store.put_message(&message)?;

        chat.updated_at = now;
        self.store.put_chat(&chat)?;

        tracing::debug!(chat_id = %chat_id, message_id = %message_id, ?role, "Message created");
        Ok(message)
    }

    async fn get_message(&self, message_id: MessageId) -> Result<Message> {
        self.store
            .get_message(message_id)?
            .ok_or(ChatError::MessageNotFound(message_id))
    }

    async fn list_messages(&self, params: PageParams) -> Result<Page<Message>> {
        let result = self
            .store
            .list_messages(params.offset, params.clamped_limit())?;
        Ok(Self::page(params, result))
    }

    async fn list_chat_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        self.get_chat(chat_id).await?;
        Ok(self.store.list_messages_by_chat(chat_id)?)
    }

    async fn update_message(
        &self,
        message_id: MessageId,
        update: UpdateMessageRequest,
    ) -> Result<Message> {
        let mut message = self.get_message(message_id).await?;
        if let Some(role) = update.role {
            message.role = role;
        }
        if let Some(content) = update.content {
            message.content = content;
        }
        message.updated_at = Utc::now();
        self.store.put_message(&message)?;
        Ok(message)
    }

    async fn delete_message(&self, message_id: MessageId) -> Result<()> {
        match self.store.delete_message(message_id) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(ChatError::MessageNotFound(message_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(self.store.ping()?)
    }
}
