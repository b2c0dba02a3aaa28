//! Core identifier types for concourse.
//!
//! Chats, messages, and users are all keyed by positive 64-bit integers issued
//! by their owning service. The newtypes keep them from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The string is not a decimal integer.
    #[error("not a decimal integer: {0}")]
    NotANumber(String),

    /// Identifiers must be strictly positive.
    #[error("identifier must be positive, got {0}")]
    NotPositive(i64),
}

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new identifier from its raw value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Return the raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Big-endian byte encoding, used for ordered storage keys.
            #[must_use]
            pub const fn to_be_bytes(self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            /// Decode from a big-endian byte encoding.
            #[must_use]
            pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
                Self(i64::from_be_bytes(bytes))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| IdError::NotANumber(s.to_string()))?;
                if value <= 0 {
                    return Err(IdError::NotPositive(value));
                }
                Ok(Self(value))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

int_id! {
    /// Identifier of a user, issued by the authorization service.
    UserId
}

int_id! {
    /// Identifier of a chat owned by the local chat store.
    ChatId
}

int_id! {
    /// Identifier of a message within the local chat store.
    MessageId
}
