//! Error types for the chat domain.

use concourse_core::{ChatId, MessageId};
use concourse_http::HttpError;
use concourse_store::StoreError;
use thiserror::Error;

/// A result type using `ChatError`.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors that can occur in chat and message operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The requested chat was not found.
    #[error("chat not found: {0}")]
    ChatNotFound(ChatId),

    /// The requested message was not found.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    /// No reply generator is registered under this name.
    #[error("unsupported agent: {0}")]
    UnsupportedAgent(String),

    /// A reply generator failed to register at startup.
    #[error("invalid agent registration: {0}")]
    InvalidAgent(String),

    /// A reply generator failed to produce a reply.
    #[error("agent {agent} failed: {source}")]
    Generation {
        /// Name of the failing agent.
        agent: String,
        /// Underlying outbound failure.
        #[source]
        source: HttpError,
    },

    /// An upstream dependency call failed.
    #[error("upstream error: {0}")]
    Upstream(#[from] HttpError),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ChatError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::ChatNotFound(_) | Self::MessageNotFound(_) => 404,
            Self::Generation { source, .. } | Self::Upstream(source) => source.http_status_code(),
            Self::UnsupportedAgent(_) | Self::InvalidAgent(_) | Self::Store(_) => 500,
        }
    }

    /// Short machine-readable name used in error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ChatNotFound(_) | Self::MessageNotFound(_) => "NotFound",
            Self::UnsupportedAgent(_) => "UnsupportedAgent",
            Self::InvalidAgent(_) => "InvalidAgent",
            Self::Generation { .. } => "AgentError",
            Self::Upstream(_) => "UpstreamError",
            Self::Store(_) => "StorageError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ChatError::ChatNotFound(ChatId::new(1)).http_status_code(), 404);
        assert_eq!(
            ChatError::UnsupportedAgent("gpt".into()).http_status_code(),
            500
        );
        let timeout = ChatError::Generation {
            agent: "agenda".into(),
            source: HttpError::Timeout {
                url: "http://agent".into(),
                attempts: 3,
            },
        };
        assert_eq!(timeout.http_status_code(), 504);
    }
}
