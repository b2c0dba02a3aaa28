//! Key encoding utilities for `RocksDB`.
//!
//! Ids are encoded big-endian so that byte order equals numeric order and a
//! forward scan returns records oldest first.

use concourse_core::{ChatId, MessageId};

use crate::error::{Result, StoreError};
use crate::schema::cf;

/// Encode a chat key.
#[must_use]
pub fn chat_key(chat_id: ChatId) -> Vec<u8> {
    chat_id.to_be_bytes().to_vec()
}

/// Encode a message key.
#[must_use]
pub fn message_key(message_id: MessageId) -> Vec<u8> {
    message_id.to_be_bytes().to_vec()
}

/// Encode a chat-message index key: `chat_id || message_id`.
#[must_use]
pub fn chat_message_key(chat_id: ChatId, message_id: MessageId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&chat_id.to_be_bytes());
    key.extend_from_slice(&message_id.to_be_bytes());
    key
}

/// Encode a chat prefix for scanning all messages of a chat.
#[must_use]
pub fn chat_prefix(chat_id: ChatId) -> Vec<u8> {
    chat_id.to_be_bytes().to_vec()
}

/// Extract the message ID from a chat-message index key.
///
/// # Errors
///
/// Returns `StoreError::CorruptKey` if the key is not 16 bytes.
pub fn message_id_from_index_key(key: &[u8]) -> Result<MessageId> {
    let tail: [u8; 8] = key
        .get(8..16)
        .filter(|_| key.len() == 16)
        .and_then(|s| s.try_into().ok())
        .ok_or(StoreError::CorruptKey {
            cf: cf::MESSAGES_BY_CHAT,
            expected: 16,
            got: key.len(),
        })?;
    Ok(MessageId::from_be_bytes(tail))
}

/// Decode a stored sequence counter value.
///
/// # Errors
///
/// Returns `StoreError::CorruptKey` if the value is not 8 bytes.
pub fn decode_counter(value: &[u8]) -> Result<i64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StoreError::CorruptKey {
        cf: cf::SEQUENCES,
        expected: 8,
        got: value.len(),
    })?;
    Ok(i64::from_be_bytes(bytes))
}
