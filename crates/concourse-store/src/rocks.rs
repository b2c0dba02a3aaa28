//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use concourse_core::{ChatId, MessageId};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Chat, Message, Sequence};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-increment-write on the sequence counters.
    sequence_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            sequence_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read one page of a primary column family in key order.
    fn page<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<T>, usize)> {
        let handle = self.cf(name)?;

        let mut items = Vec::new();
        let mut total = 0usize;
        for item in self.db.iterator_cf(&handle, IteratorMode::Start) {
            let (_, value) = item?;
            if total >= offset && items.len() < limit {
                items.push(Self::deserialize(&value)?);
            }
            total += 1;
        }

        Ok((items, total))
    }

    /// Collect the index keys of every message in a chat.
    fn message_index_keys(&self, chat_id: ChatId) -> Result<Vec<Box<[u8]>>> {
        let cf_by_chat = self.cf(cf::MESSAGES_BY_CHAT)?;
        let prefix = keys::chat_prefix(chat_id);

        let mut found = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_by_chat, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, _) = item?;

            // Stop if we're past the prefix
            if !key.starts_with(&prefix) {
                break;
            }
            found.push(key);
        }

        Ok(found)
    }
}

impl Store for RocksStore {
    fn allocate_id(&self, sequence: Sequence) -> Result<i64> {
        let cf_seq = self.cf(cf::SEQUENCES)?;
        let _guard = self.sequence_lock.lock();

        let current = self
            .db
            .get_cf(&cf_seq, sequence.key())?
            .map(|raw| keys::decode_counter(&raw))
            .transpose()?
            .unwrap_or(0);
        let next = current + 1;

        self.db.put_cf(&cf_seq, sequence.key(), next.to_be_bytes())?;
        Ok(next)
    }

    fn ping(&self) -> Result<()> {
        for name in all_column_families() {
            let handle = self.cf(name)?;
            self.db
                .property_int_value_cf(&handle, "rocksdb.estimate-num-keys")?;
        }
        Ok(())
    }

    // =========================================================================
    // Chat Operations
    // =========================================================================

    fn put_chat(&self, chat: &Chat) -> Result<()> {
        let cf_chats = self.cf(cf::CHATS)?;
        let value = Self::serialize(chat)?;

        self.db
            .put_cf(&cf_chats, keys::chat_key(chat.chat_id), value)?;
        Ok(())
    }

    fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        let cf_chats = self.cf(cf::CHATS)?;

        self.db
            .get_cf(&cf_chats, keys::chat_key(chat_id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_chat(&self, chat_id: ChatId) -> Result<()> {
        let cf_chats = self.cf(cf::CHATS)?;
        let cf_messages = self.cf(cf::MESSAGES)?;
        let cf_by_chat = self.cf(cf::MESSAGES_BY_CHAT)?;

        if self.get_chat(chat_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_chats, keys::chat_key(chat_id));

        // Cascade to the chat's messages
        for index_key in self.message_index_keys(chat_id)? {
            let message_id = keys::message_id_from_index_key(&index_key)?;
            batch.delete_cf(&cf_messages, keys::message_key(message_id));
            batch.delete_cf(&cf_by_chat, &index_key);
        }

        self.db.write(batch)?;
        tracing::debug!(chat_id = %chat_id, "Deleted chat and its messages");
        Ok(())
    }

    fn list_chats(&self, offset: usize, limit: usize) -> Result<(Vec<Chat>, usize)> {
        self.page(cf::CHATS, offset, limit)
    }

    // =========================================================================
    // Message Operations
    // =========================================================================

    fn put_message(&self, message: &Message) -> Result<()> {
        let cf_messages = self.cf(cf::MESSAGES)?;
        let cf_by_chat = self.cf(cf::MESSAGES_BY_CHAT)?;
        let value = Self::serialize(message)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_messages, keys::message_key(message.message_id), &value);
        // Index entry is idempotent
        batch.put_cf(
            &cf_by_chat,
            keys::chat_message_key(message.chat_id, message.message_id),
            [],
        );

        self.db.write(batch)?;
        Ok(())
    }

    fn get_message(&self, message_id: MessageId) -> Result<Option<Message>> {
        let cf_messages = self.cf(cf::MESSAGES)?;

        self.db
            .get_cf(&cf_messages, keys::message_key(message_id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_message(&self, message_id: MessageId) -> Result<()> {
        let cf_messages = self.cf(cf::MESSAGES)?;
        let cf_by_chat = self.cf(cf::MESSAGES_BY_CHAT)?;

        // Get the message to find its chat
        let message = self.get_message(message_id)?.ok_or(StoreError::NotFound)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_messages, keys::message_key(message_id));
        batch.delete_cf(
            &cf_by_chat,
            keys::chat_message_key(message.chat_id, message_id),
        );

        self.db.write(batch)?;
        Ok(())
    }

    fn list_messages(&self, offset: usize, limit: usize) -> Result<(Vec<Message>, usize)> {
        self.page(cf::MESSAGES, offset, limit)
    }

    fn list_messages_by_chat(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for index_key in self.message_index_keys(chat_id)? {
            let message_id = keys::message_id_from_index_key(&index_key)?;
            if let Some(message) = self.get_message(message_id)? {
                messages.push(message);
            }
        }
        Ok(messages)
    }
}
