//! Redis-backed conversation cache.
//!
//! Each transcript is one JSON string under `{prefix}{conversation_id}`
//! (prefix `chat:` unless configured), written with `SET .. EX ttl`. Every call is bounded by the configured timeout.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

use crate::domain::conversation::Conversation;
use crate::domain::foundation::ConversationId;
use crate::ports::{CacheError, ConversationCache};

const DEFAULT_KEY_PREFIX: &str = "chat:";

/// Redis cache shared by every coordinator instance.
#[derive(Clone)]
pub struct RedisConversationCache {
    conn: MultiplexedConnection,
    timeout: Duration,
    key_prefix: String,
}

impl RedisConversationCache {
    pub fn new(conn: MultiplexedConnection, timeout: Duration) -> Self {
        Self {
            conn,
            timeout,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, id: &ConversationId) -> String {
        cache_key(&self.key_prefix, id)
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(|e| CacheError::Unavailable(e.to_string())),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait]
impl ConversationCache for RedisConversationCache {
    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(id);
        let raw: Option<String> = self.bounded(conn.get(&key)).await?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(&self, conversation: &Conversation, ttl: Duration) -> Result<(), CacheError> {
        let json = serde_json::to_string(conversation)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        let key = self.key(conversation.id());

        self.bounded(
            redis::cmd("SET")
                .arg(&key)
                .arg(json)
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .query_async::<_, ()>(&mut conn),
        )
        .await
    }

    async fn invalidate(&self, id: &ConversationId) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.key(id);
        let _removed: i64 = self.bounded(conn.del(&key)).await?;
        Ok(())
    }
}

fn cache_key(prefix: &str, id: &ConversationId) -> String {
    format!("{}{}", prefix, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainSlug, UserId};

    #[test]
    fn key_joins_prefix_and_id() {
        let id = ConversationId::allocate(
            &UserId::new("alice").unwrap(),
            &DomainSlug::new("travel").unwrap(),
        );
        assert_eq!(cache_key(DEFAULT_KEY_PREFIX, &id), format!("chat:{}", id));
        assert_eq!(cache_key("staging:chat:", &id), format!("staging:chat:{}", id));
    }
}
