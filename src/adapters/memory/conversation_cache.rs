//! In-memory conversation cache with TTL expiry.
//!
//! Expiry uses `tokio::time::Instant`, so tests running with paused time can
//! advance past the TTL deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::conversation::Conversation;
use crate::domain::foundation::ConversationId;
use crate::ports::{CacheError, ConversationCache};

#[derive(Debug, Clone)]
struct Entry {
    conversation: Conversation,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationCache {
    entries: Arc<RwLock<HashMap<ConversationId, Entry>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryConversationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `put` fail, simulating a cache outage on the write path.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Drop every entry, as an eviction storm would.
    pub async fn evict_all(&self) {
        self.entries.write().await.clear();
    }

    /// True if a live entry exists for `id`.
    pub async fn contains(&self, id: &ConversationId) -> bool {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| e.expires_at > Instant::now())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ConversationCache for InMemoryConversationCache {
    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(id) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.conversation.clone())),
            Some(_) => {
                entries.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, conversation: &Conversation, ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("in-memory cache writes disabled".into()));
        }
        self.entries.write().await.insert(
            conversation.id().clone(),
            Entry {
                conversation: conversation.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, id: &ConversationId) -> Result<(), CacheError> {
        self.entries.write().await.remove(id);
        Ok(())
    }
}
