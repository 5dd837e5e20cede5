//! Redis adapters.

mod conversation_cache;

pub use conversation_cache::RedisConversationCache;
