//! Conversation cache port.
//!
//! A best-effort mirror of recently used transcripts. Entries expire after a
//! TTL; a miss is never an error, callers reload from the store.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::conversation::Conversation;
use crate::domain::foundation::ConversationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation timed out")]
    Timeout,

    #[error("cached value could not be decoded: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait ConversationCache: Send + Sync {
    /// Cached snapshot, or `None` on miss or expiry.
    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, CacheError>;

    /// Overwrite the snapshot for `conversation.id()` with a fresh TTL.
    async fn put(&self, conversation: &Conversation, ttl: Duration) -> Result<(), CacheError>;

    /// Drop the snapshot. Missing keys are not an error.
    async fn invalidate(&self, id: &ConversationId) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_cache_is_object_safe() {
        fn _accepts_dyn(_cache: &dyn ConversationCache) {}
    }
}
