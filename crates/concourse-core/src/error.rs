//! Common error types for concourse.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the concourse system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// A role name was not recognised.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A run mode name was not recognised.
    #[error("unknown run mode: {0}")]
    UnknownMode(String),
}
