//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary chat records, keyed by `chat_id`.
    pub const CHATS: &str = "chats";

    /// Primary message records, keyed by `message_id`.
    pub const MESSAGES: &str = "messages";

    /// Index: messages by chat, keyed by `chat_id || message_id`.
    pub const MESSAGES_BY_CHAT: &str = "messages_by_chat";

    /// Monotonic id counters, keyed by sequence name.
    pub const SEQUENCES: &str = "sequences";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::CHATS, cf::MESSAGES, cf::MESSAGES_BY_CHAT, cf::SEQUENCES]
}
