//! HTTP request handlers.
//!
//! Handlers under `agenda` and `auth` shape answers the pipeline already
//! fetched from an upstream. `chats` and `messages` work against the local
//! chat store.

pub mod agenda;
pub mod auth;
pub mod chats;
pub mod fallback;
pub mod health;
pub mod messages;
