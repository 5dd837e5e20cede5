//! In-memory conversation store for tests and single-process development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{Conversation, ConversationSummary, Message};
use crate::domain::faq::RecentQuestion;
use crate::domain::foundation::{ConversationId, DomainSlug, UserId};
use crate::ports::{ConversationStore, StoreError};

/// In-memory store with an outage switch for failure-path tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
    unavailable: Arc<AtomicBool>,
    find_calls: Arc<AtomicUsize>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `StoreError::Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `find` calls served so far.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("in-memory store switched off"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.check_available()?;
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(conversation.id()) {
            return Err(StoreError::conflict(format!(
                "conversation {} already exists",
                conversation.id()
            )));
        }
        conversations.insert(conversation.id().clone(), conversation.clone());
        Ok(())
    }

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        self.check_available()?;
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn append_message(
        &self,
        id: &ConversationId,
        seq: usize,
        message: &Message,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(id)
            .ok_or_else(|| StoreError::corrupt(format!("conversation {} has no header row", id)))?;

        if conversation.message_count() != seq {
            return Err(StoreError::conflict(format!(
                "seq {} taken in conversation {}",
                seq, id
            )));
        }
        conversation.append(message.role, message.content.clone(), message.timestamp);
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        domain: &DomainSlug,
        title_max_chars: usize,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        self.check_available()?;
        let conversations = self.conversations.read().await;
        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .filter(|c| c.belongs_to(user_id) && c.domain() == domain)
            .map(|c| c.summary(title_max_chars))
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn recent_user_questions(
        &self,
        domain: &DomainSlug,
        limit: usize,
    ) -> Result<Vec<RecentQuestion>, StoreError> {
        self.check_available()?;
        let conversations = self.conversations.read().await;
        let mut questions: Vec<RecentQuestion> = conversations
            .values()
            .filter(|c| c.domain() == domain)
            .flat_map(|c| c.messages().iter().filter(|m| m.is_user()))
            .map(|m| RecentQuestion::new(m.content.clone(), m.timestamp))
            .collect();
        questions.sort_by(|a, b| b.asked_at.cmp(&a.asked_at));
        questions.truncate(limit);
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Role;
    use crate::domain::foundation::Timestamp;

    fn conversation() -> Conversation {
        let user = UserId::new("alice").unwrap();
        let domain = DomainSlug::new("finance").unwrap();
        Conversation::start(
            ConversationId::allocate(&user, &domain),
            user,
            domain,
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn append_rejects_taken_seq() {
        let store = InMemoryConversationStore::new();
        let conv = conversation();
        store.create(&conv).await.unwrap();

        let msg = Message::new(Role::User, "hello", conv.created_at().plus_secs(1));
        store.append_message(conv.id(), 0, &msg).await.unwrap();

        let err = store.append_message(conv.id(), 0, &msg).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn outage_switch_fails_every_call() {
        let store = InMemoryConversationStore::new();
        store.set_unavailable(true);
        let err = store.find(conversation().id()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
