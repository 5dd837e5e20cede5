//! FaqSuggestionCache - per-domain suggested questions.
//!
//! Read-only over conversation data. Derivation failures never reach the
//! caller: the last good entry is served, or an empty list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::faq::{derive_suggestions, FaqCacheEntry};
use crate::domain::foundation::{DomainSlug, Timestamp};
use crate::ports::ConversationStore;

#[derive(Debug, Clone)]
pub struct FaqConfig {
    pub ttl: Duration,
    pub max_suggestions: usize,
    /// Recent user questions sampled per derivation.
    pub sample_size: usize,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_suggestions: 6,
            sample_size: 200,
        }
    }
}

pub struct FaqSuggestionCache {
    store: Arc<dyn ConversationStore>,
    entries: RwLock<HashMap<DomainSlug, FaqCacheEntry>>,
    config: FaqConfig,
}

impl FaqSuggestionCache {
    pub fn new(store: Arc<dyn ConversationStore>, config: FaqConfig) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub async fn get(&self, domain: &DomainSlug) -> Vec<String> {
        self.get_at(domain, Timestamp::now()).await
    }

    /// Suggestions for `domain` as of `now`.
    pub async fn get_at(&self, domain: &DomainSlug, now: Timestamp) -> Vec<String> {
        let previous = self.entries.read().await.get(domain).cloned();
        if let Some(entry) = &previous {
            if !entry.is_expired(now) {
                return entry.suggestions.clone();
            }
        }

        let sample = match self
            .store
            .recent_user_questions(domain, self.config.sample_size)
            .await
        {
            Ok(sample) => sample,
            Err(err) => {
                tracing::warn!(domain = %domain, error = %err, "faq derivation failed; serving previous entry");
                return previous.map(|e| e.suggestions).unwrap_or_default();
            }
        };

        let suggestions = derive_suggestions(&sample, self.config.max_suggestions);
        let entry = FaqCacheEntry {
            domain: domain.clone(),
            suggestions: suggestions.clone(),
            expires_at: now.plus_secs(self.config.ttl.as_secs()),
        };
        self.entries.write().await.insert(domain.clone(), entry);

        tracing::debug!(domain = %domain, count = suggestions.len(), "faq suggestions refreshed");
        suggestions
    }

    pub async fn invalidate(&self, domain: &DomainSlug) {
        self.entries.write().await.remove(domain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryConversationStore;
    use crate::domain::conversation::{Conversation, Role};
    use crate::domain::foundation::{ConversationId, UserId};

    fn travel() -> DomainSlug {
        DomainSlug::new("travel").unwrap()
    }

    async fn seed(store: &InMemoryConversationStore, user: &str, questions: &[&str]) {
        let user = UserId::new(user).unwrap();
        let id = ConversationId::allocate(&user, &travel());
        let mut conversation = Conversation::start(id.clone(), user, travel(), Timestamp::now());
        store.create(&conversation).await.unwrap();
        for q in questions {
            let (seq, message) = conversation.append(Role::User, *q, Timestamp::now());
            store.append_message(&id, seq, message).await.unwrap();
        }
    }

    fn cache(store: &InMemoryConversationStore) -> FaqSuggestionCache {
        FaqSuggestionCache::new(Arc::new(store.clone()), FaqConfig::default())
    }

    #[tokio::test]
    async fn ranks_repeated_questions_first() {
        let store = InMemoryConversationStore::new();
        seed(&store, "alice", &["How much luggage can I bring?", "Do I need a visa for Japan?"]).await;
        seed(&store, "bob", &["do i need a visa for japan"]).await;

        let suggestions = cache(&store).get(&travel()).await;

        assert_eq!(suggestions[0], "do i need a visa for japan");
        assert_eq!(suggestions.len(), 2);
    }

    #[tokio::test]
    async fn serves_cached_entry_until_expiry() {
        let store = InMemoryConversationStore::new();
        seed(&store, "alice", &["Can I change my flight date?"]).await;
        let cache = cache(&store);
        let now = Timestamp::now();

        assert_eq!(cache.get_at(&travel(), now).await.len(), 1);
        seed(&store, "bob", &["Is travel insurance included?"]).await;

        assert_eq!(cache.get_at(&travel(), now.plus_secs(299)).await.len(), 1);
        assert_eq!(cache.get_at(&travel(), now.plus_secs(300)).await.len(), 2);
    }

    #[tokio::test]
    async fn store_outage_serves_previous_entry() {
        let store = InMemoryConversationStore::new();
        seed(&store, "alice", &["Can I change my flight date?"]).await;
        let cache = cache(&store);
        let now = Timestamp::now();
        let first = cache.get_at(&travel(), now).await;

        store.set_unavailable(true);
        assert_eq!(cache.get_at(&travel(), now.plus_secs(600)).await, first);

        cache.invalidate(&travel()).await;
        assert!(cache.get_at(&travel(), now.plus_secs(600)).await.is_empty());
    }
}
