//! `RocksDB` storage layer for concourse.
//!
//! This crate provides persistent storage for chats and messages using `RocksDB`
//! with column families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `chats`: Primary chat records, keyed by `chat_id`
//! - `messages`: Primary message records, keyed by `message_id`
//! - `messages_by_chat`: Index for listing messages by chat
//! - `sequences`: Id counters for chats and messages
//!
//! # Example
//!
//! ```no_run
//! use concourse_store::{RocksStore, Store};
//! use concourse_core::ChatId;
//!
//! let store = RocksStore::open("/tmp/concourse-db").unwrap();
//!
//! // List messages of a chat
//! let messages = store.list_messages_by_chat(ChatId::new(1)).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{Chat, ChatRole, Message, Sequence};

use concourse_core::{ChatId, MessageId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    /// Allocate the next id from a sequence. Ids start at 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn allocate_id(&self, sequence: Sequence) -> Result<i64>;

    /// Check that the database is reachable and its column families exist.
    ///
    /// # Errors
    ///
    /// Returns an error describing the failing column family.
    fn ping(&self) -> Result<()>;

    // =========================================================================
    // Chat Operations
    // =========================================================================

    /// Insert or update a chat record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_chat(&self, chat: &Chat) -> Result<()>;

    /// Get a chat by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>>;

    /// Delete a chat and every message belonging to it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the chat doesn't exist.
    fn delete_chat(&self, chat_id: ChatId) -> Result<()>;

    /// List chats in id order, returning one page and the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_chats(&self, offset: usize, limit: usize) -> Result<(Vec<Chat>, usize)>;

    // =========================================================================
    // Message Operations
    // =========================================================================

    /// Insert or update a message record, maintaining the chat index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_message(&self, message: &Message) -> Result<()>;

    /// Get a message by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_message(&self, message_id: MessageId) -> Result<Option<Message>>;

    /// Delete a message by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the message doesn't exist.
    fn delete_message(&self, message_id: MessageId) -> Result<()>;

    /// List messages in id order, returning one page and the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_messages(&self, offset: usize, limit: usize) -> Result<(Vec<Message>, usize)>;

    /// List all messages of a chat, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_messages_by_chat(&self, chat_id: ChatId) -> Result<Vec<Message>>;
}
