//! Conversation-specific error types.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, ErrorCode, ValidationError};

/// Errors returned by conversation operations.
#[derive(Debug, Clone, Error)]
pub enum ConversationError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Unknown id, or an id that belongs to someone else.
    #[error("conversation not found: {0}")]
    NotFound(String),

    /// Generation failed after the user message was stored.
    ///
    /// The transcript already ends with `fallback_answer`.
    #[error("generation backend failed for {conversation_id}: {reason}")]
    Upstream {
        conversation_id: ConversationId,
        fallback_answer: String,
        reason: String,
        timed_out: bool,
    },

    #[error("conversation store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ConversationError {
    pub fn not_found(id: impl ToString) -> Self {
        ConversationError::NotFound(id.to_string())
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        ConversationError::StoreUnavailable(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConversationError::Validation(_) => ErrorCode::ValidationFailed,
            ConversationError::NotFound(_) => ErrorCode::ConversationNotFound,
            ConversationError::Upstream { timed_out: true, .. } => ErrorCode::UpstreamTimeout,
            ConversationError::Upstream { .. } => ErrorCode::UpstreamServiceError,
            ConversationError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainSlug, UserId};

    #[test]
    fn upstream_code_distinguishes_timeouts() {
        let id = ConversationId::allocate(
            &UserId::new("alice").unwrap(),
            &DomainSlug::new("travel").unwrap(),
        );
        let failed = ConversationError::Upstream {
            conversation_id: id.clone(),
            fallback_answer: "sorry".into(),
            reason: "503".into(),
            timed_out: false,
        };
        let timed_out = ConversationError::Upstream {
            conversation_id: id,
            fallback_answer: "sorry".into(),
            reason: "timeout".into(),
            timed_out: true,
        };

        assert_eq!(failed.code(), ErrorCode::UpstreamServiceError);
        assert_eq!(timed_out.code(), ErrorCode::UpstreamTimeout);
    }

    #[test]
    fn validation_converts_from_value_errors() {
        let err: ConversationError = ValidationError::empty_field("question").into();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.to_string(), "question must not be blank");
    }
}
