//! Conversation store port (authoritative persistence).
//!
//! The store is the source of truth for transcripts. The cache mirrors it
//! and is rebuilt from it on every miss.
//!
//! # Design
//!
//! - **Append-only**: messages are inserted with an explicit sequence number
//!   and never updated or deleted
//! - **Owner-scoped listing**: summaries are always filtered by user

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{Conversation, ConversationSummary, Message};
use crate::domain::faq::RecentQuestion;
use crate::domain::foundation::{ConversationId, DomainSlug, UserId};

/// Failures shared by the persistence ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached or timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A compare-and-swap or uniqueness check failed.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Persisted data could not be mapped back into domain types.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        StoreError::Corrupt(message.into())
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a new, empty conversation.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the id already exists
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Load a conversation with all messages in order.
    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// Append one message at position `seq` (zero-based) and bump the
    /// conversation's `updated_at` to the message timestamp.
    ///
    /// # Errors
    ///
    /// - `Conflict` if `seq` is already taken
    /// - `Unavailable` if the conversation does not exist
    async fn append_message(
        &self,
        id: &ConversationId,
        seq: usize,
        message: &Message,
    ) -> Result<(), StoreError>;

    /// Summaries of a user's conversations in a domain, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        domain: &DomainSlug,
        title_max_chars: usize,
    ) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Most recent user questions in a domain across all users, newest first.
    async fn recent_user_questions(
        &self,
        domain: &DomainSlug,
        limit: usize,
    ) -> Result<Vec<RecentQuestion>, StoreError>;
}
