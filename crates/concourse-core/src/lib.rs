//! Core types and utilities for concourse.
//!
//! This crate provides the foundational types shared by every concourse crate:
//!
//! - **Identifiers**: Strongly-typed IDs for users, chats, and messages
//! - **Roles**: Caller roles, the run mode, and the role groups built from them
//! - **Health**: Dependency health reports aggregated by the gateway
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use concourse_core::{ChatId, Role, RoleGroup, RunMode};
//!
//! let chat_id: ChatId = "42".parse().unwrap();
//! assert_eq!(chat_id.get(), 42);
//!
//! // Developers only exist outside production.
//! assert!(RoleGroup::Private.allows(Role::Developer, RunMode::Dev));
//! assert!(!RoleGroup::Private.allows(Role::Developer, RunMode::Prod));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod health;
pub mod ids;
pub mod role;

pub use error::{CoreError, Result};
pub use health::{DependencyHealth, DependencyType, HealthReport, HealthStatus};
pub use ids::{ChatId, IdError, MessageId, UserId};
pub use role::{Role, RoleGroup, RunMode};
