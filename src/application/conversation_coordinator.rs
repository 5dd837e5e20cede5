//! ConversationCoordinator - owns transcript mutation and the write-through
//! cache.
//!
//! # Ordering
//!
//! Every mutation of one conversation runs under that conversation's keyed
//! lock and re-reads the transcript from the store, so appends are strictly
//! ordered even when the cache is stale or shared between instances.
//!
//! `ask` drops the cached snapshot before its first store write and only
//! repopulates it after the last one. A failed write, or a caller that stops
//! polling mid-generation, therefore leaves no snapshot older than the store.
//!
//! # Failure handling
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | Store write | `StoreUnavailable`, cache entry dropped |
//! | Cache read | logged, served from the store |
//! | Cache write | logged, entry invalidated |
//! | Generation error or timeout | apology appended, `Upstream` returned |

use std::sync::Arc;
use std::time::Duration;

use crate::domain::conversation::{
    build_prompt, Conversation, ConversationError, ConversationSummary, DomainCatalog, Message,
    Role, SupportDomain,
};
use crate::domain::foundation::{ConversationId, DomainSlug, Timestamp, UserId, ValidationError};
use crate::ports::{ConversationCache, ConversationStore, GenerationError, StoreError, TextGenerator};

use super::keyed_lock::KeyedLock;

/// Assistant reply stored when generation fails.
pub const APOLOGY_ANSWER: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again later.";

/// Longest question accepted.
pub const MAX_QUESTION_CHARS: usize = 4000;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Prior messages handed to the generator.
    pub context_window: usize,
    pub cache_ttl: Duration,
    pub generation_timeout: Duration,
    pub title_max_chars: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            context_window: 6,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            generation_timeout: Duration::from_secs(20),
            title_max_chars: 60,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn with_title_max_chars(mut self, max: usize) -> Self {
        self.title_max_chars = max;
        self
    }
}

/// `POST /ask` in one call: resume or start, then ask.
#[derive(Debug, Clone)]
pub struct AskCommand {
    pub user_id: UserId,
    pub domain: String,
    pub question: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskResult {
    pub conversation_id: ConversationId,
    pub domain: DomainSlug,
    pub answer: String,
    /// Timestamp of the stored assistant message.
    pub timestamp: Timestamp,
}

pub struct ConversationCoordinator {
    store: Arc<dyn ConversationStore>,
    cache: Arc<dyn ConversationCache>,
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<DomainCatalog>,
    locks: KeyedLock<ConversationId>,
    config: CoordinatorConfig,
}

fn store_failure(err: StoreError) -> ConversationError {
    tracing::error!(error = %err, "conversation store failure");
    ConversationError::store_unavailable(err.to_string())
}

impl ConversationCoordinator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        cache: Arc<dyn ConversationCache>,
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<DomainCatalog>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            cache,
            generator,
            catalog,
            locks: KeyedLock::new(),
            config,
        }
    }

    pub fn catalog(&self) -> &DomainCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Returns the id to ask against: the given one after an ownership check,
    /// or a freshly allocated conversation.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unknown domain, or a resumed conversation that
    ///   belongs to a different domain
    /// - `NotFound` for an unknown id or one owned by someone else
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn start_or_resume(
        &self,
        user_id: &UserId,
        domain: &str,
        conversation_id: Option<&str>,
    ) -> Result<ConversationId, ConversationError> {
        let domain = self.catalog.resolve(domain)?;

        if let Some(raw) = conversation_id {
            let conversation = self.load_owned(raw, Some(user_id)).await?;
            if conversation.domain() != &domain.slug {
                return Err(ValidationError::invalid_format(
                    "domain",
                    format!(
                        "conversation belongs to '{}', not '{}'",
                        conversation.domain(),
                        domain.slug
                    ),
                )
                .into());
            }
            return Ok(conversation.id().clone());
        }

        let id = ConversationId::allocate(user_id, &domain.slug);
        let conversation =
            Conversation::start(id.clone(), user_id.clone(), domain.slug.clone(), Timestamp::now());
        self.store.create(&conversation).await.map_err(store_failure)?;
        self.write_cache(&conversation).await;

        tracing::info!(conversation_id = %id, domain = %domain.slug, "conversation started");
        Ok(id)
    }

    /// Appends the question, generates an answer and appends it.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty or oversized question
    /// - `NotFound` if the conversation is unknown or not owned by `user_id`
    /// - `Upstream` if generation failed; the apology is already stored
    /// - `StoreUnavailable` if the store rejected a write
    #[tracing::instrument(skip(self, question), fields(conversation_id = %conversation_id))]
    pub async fn ask(
        &self,
        user_id: &UserId,
        conversation_id: &ConversationId,
        question: &str,
    ) -> Result<AskResult, ConversationError> {
        let question = validate_question(question)?;

        let _guard = self.locks.lock(conversation_id).await;

        let mut conversation = self
            .store
            .find(conversation_id)
            .await
            .map_err(store_failure)?
            .filter(|c| c.belongs_to(user_id))
            .ok_or_else(|| ConversationError::not_found(conversation_id))?;
        let domain = self.domain_of(&conversation)?;

        let context: Vec<Message> = conversation.recent(self.config.context_window).to_vec();

        self.drop_cached(conversation_id).await;

        let (seq, message) = conversation.append(Role::User, question, Timestamp::now());
        let message = message.clone();
        self.append_or_drop_cached(conversation_id, seq, &message).await?;

        let prompt = build_prompt(&domain, &context, question);
        let generated = self.generate(&prompt).await;

        let (answer, failure) = match generated {
            Ok(answer) => (answer, None),
            Err(err) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    provider = self.generator.provider_name(),
                    error = %err,
                    "generation failed; storing apology"
                );
                (APOLOGY_ANSWER.to_string(), Some(err))
            }
        };

        let (seq, message) = conversation.append(Role::Assistant, answer.clone(), Timestamp::now());
        let message = message.clone();
        self.append_or_drop_cached(conversation_id, seq, &message).await?;
        self.write_cache(&conversation).await;

        match failure {
            None => {
                tracing::debug!(conversation_id = %conversation_id, messages = conversation.message_count(), "answered");
                Ok(AskResult {
                    conversation_id: conversation_id.clone(),
                    domain: conversation.domain().clone(),
                    answer,
                    timestamp: message.timestamp,
                })
            }
            Some(err) => Err(ConversationError::Upstream {
                conversation_id: conversation_id.clone(),
                fallback_answer: answer,
                timed_out: err.is_timeout(),
                reason: err.to_string(),
            }),
        }
    }

    /// `start_or_resume` followed by `ask`.
    pub async fn ask_question(&self, cmd: AskCommand) -> Result<AskResult, ConversationError> {
        validate_question(&cmd.question)?;
        let id = self
            .start_or_resume(&cmd.user_id, &cmd.domain, cmd.conversation_id.as_deref())
            .await?;
        self.ask(&cmd.user_id, &id, &cmd.question).await
    }

    /// Ordered transcript. Served from the cache when possible.
    ///
    /// When `requester` is given, conversations owned by anyone else are
    /// reported as not found.
    #[tracing::instrument(skip(self))]
    pub async fn history(
        &self,
        conversation_id: &str,
        requester: Option<&UserId>,
    ) -> Result<Vec<Message>, ConversationError> {
        let conversation = self.load_owned(conversation_id, requester).await?;
        Ok(conversation.messages().to_vec())
    }

    /// The user's conversations in `domain`, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        domain: &str,
    ) -> Result<Vec<ConversationSummary>, ConversationError> {
        let domain = self.catalog.resolve(domain)?;
        self.store
            .list_for_user(user_id, &domain.slug, self.config.title_max_chars)
            .await
            .map_err(store_failure)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn load_owned(
        &self,
        raw_id: &str,
        requester: Option<&UserId>,
    ) -> Result<Conversation, ConversationError> {
        let id = ConversationId::parse(raw_id).map_err(|_| ConversationError::not_found(raw_id))?;
        let conversation = self
            .read_through(&id)
            .await?
            .ok_or_else(|| ConversationError::not_found(&id))?;

        match requester {
            Some(user) if !conversation.belongs_to(user) => Err(ConversationError::not_found(&id)),
            _ => Ok(conversation),
        }
    }

    /// Cache first; on miss or cache failure, the store, then repopulate.
    async fn read_through(&self, id: &ConversationId) -> Result<Option<Conversation>, ConversationError> {
        match self.cache.get(id).await {
            Ok(Some(conversation)) => return Ok(Some(conversation)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(conversation_id = %id, error = %err, "cache read failed; using store");
            }
        }

        let loaded = self.store.find(id).await.map_err(store_failure)?;
        if let Some(conversation) = &loaded {
            self.write_cache(conversation).await;
        }
        Ok(loaded)
    }

    async fn append_or_drop_cached(
        &self,
        id: &ConversationId,
        seq: usize,
        message: &Message,
    ) -> Result<(), ConversationError> {
        if let Err(err) = self.store.append_message(id, seq, message).await {
            // a concurrent reader may have cached a snapshot in between
            self.drop_cached(id).await;
            return Err(store_failure(err));
        }
        Ok(())
    }

    async fn drop_cached(&self, id: &ConversationId) {
        if let Err(err) = self.cache.invalidate(id).await {
            tracing::warn!(conversation_id = %id, error = %err, "cache invalidation failed");
        }
    }

    async fn write_cache(&self, conversation: &Conversation) {
        if let Err(err) = self.cache.put(conversation, self.config.cache_ttl).await {
            tracing::warn!(
                conversation_id = %conversation.id(),
                error = %err,
                "cache write failed; invalidating"
            );
            self.drop_cached(conversation.id()).await;
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let timeout = self.config.generation_timeout;
        match tokio::time::timeout(timeout, self.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    fn domain_of(&self, conversation: &Conversation) -> Result<SupportDomain, ConversationError> {
        self.catalog
            .get(conversation.domain())
            .cloned()
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "domain",
                    format!("'{}' is no longer a supported domain", conversation.domain()),
                )
                .into()
            })
    }
}

fn validate_question(question: &str) -> Result<&str, ValidationError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("question"));
    }
    let len = trimmed.chars().count();
    if len > MAX_QUESTION_CHARS {
        return Err(ValidationError::too_long("question", MAX_QUESTION_CHARS, len));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockTextGenerator;
    use crate::adapters::memory::{InMemoryConversationCache, InMemoryConversationStore};
    use crate::domain::foundation::ErrorCode;

    struct Harness {
        coordinator: ConversationCoordinator,
        store: InMemoryConversationStore,
        cache: InMemoryConversationCache,
        generator: MockTextGenerator,
    }

    fn harness(generator: MockTextGenerator) -> Harness {
        let store = InMemoryConversationStore::new();
        let cache = InMemoryConversationCache::new();
        let coordinator = ConversationCoordinator::new(
            Arc::new(store.clone()),
            Arc::new(cache.clone()),
            Arc::new(generator.clone()),
            Arc::new(DomainCatalog::builtin()),
            CoordinatorConfig::default().with_generation_timeout(Duration::from_millis(200)),
        );
        Harness {
            coordinator,
            store,
            cache,
            generator,
        }
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[tokio::test]
    async fn start_allocates_owned_conversation() {
        let h = harness(MockTextGenerator::new());
        let id = h.coordinator.start_or_resume(&alice(), "Finance", None).await.unwrap();

        assert!(id.as_str().starts_with("conv_finance_"));
        let stored = h.store.find(&id).await.unwrap().unwrap();
        assert!(stored.belongs_to(&alice()));
        assert_eq!(stored.message_count(), 0);
    }

    #[tokio::test]
    async fn unknown_domain_is_validation_error() {
        let h = harness(MockTextGenerator::new());
        let err = h.coordinator.start_or_resume(&alice(), "astrology", None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn resume_by_another_user_is_not_found() {
        let h = harness(MockTextGenerator::new());
        let id = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();

        let mallory = UserId::new("mallory").unwrap();
        let err = h
            .coordinator
            .start_or_resume(&mallory, "travel", Some(id.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConversationNotFound);
    }

    #[tokio::test]
    async fn resume_in_wrong_domain_is_rejected() {
        let h = harness(MockTextGenerator::new());
        let id = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();
        let err = h
            .coordinator
            .start_or_resume(&alice(), "finance", Some(id.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn ask_appends_question_and_answer() {
        let h = harness(MockTextGenerator::new().with_reply("Use the reset link."));
        let id = h.coordinator.start_or_resume(&alice(), "technical-support", None).await.unwrap();

        let result = h.coordinator.ask(&alice(), &id, "  How do I reset my password?  ").await.unwrap();

        assert_eq!(result.answer, "Use the reset link.");
        let history = h.coordinator.history(id.as_str(), Some(&alice())).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "How do I reset my password?");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].timestamp, result.timestamp);
    }

    #[tokio::test]
    async fn prompt_carries_only_the_context_window() {
        let h = harness(MockTextGenerator::new());
        let id = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();
        for i in 0..5 {
            h.coordinator.ask(&alice(), &id, &format!("question {}", i)).await.unwrap();
        }

        let last_prompt = h.generator.prompts().pop().unwrap();
        // Eight prior messages, the window keeps the last six.
        assert!(!last_prompt.contains("question 0"));
        assert!(last_prompt.contains("User: question 1\n"));
        assert!(last_prompt.contains("User: question 3\n"));
        assert!(last_prompt.contains("Current question: question 4"));
    }

    #[tokio::test]
    async fn generation_failure_stores_apology() {
        let h = harness(
            MockTextGenerator::new().with_error(GenerationError::Unavailable("503".into())),
        );
        let id = h.coordinator.start_or_resume(&alice(), "finance", None).await.unwrap();

        let err = h.coordinator.ask(&alice(), &id, "Why was I charged?").await.unwrap_err();

        match &err {
            ConversationError::Upstream {
                conversation_id,
                fallback_answer,
                timed_out,
                ..
            } => {
                assert_eq!(conversation_id, &id);
                assert_eq!(fallback_answer, APOLOGY_ANSWER);
                assert!(!timed_out);
            }
            other => panic!("unexpected {:?}", other),
        }
        let stored = h.store.find(&id).await.unwrap().unwrap();
        assert_eq!(stored.messages()[0].content, "Why was I charged?");
        assert_eq!(stored.messages()[1].content, APOLOGY_ANSWER);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_timeout_is_upstream_timeout() {
        let h = harness(MockTextGenerator::new().with_delay(Duration::from_secs(5)));
        let id = h.coordinator.start_or_resume(&alice(), "finance", None).await.unwrap();

        let err = h.coordinator.ask(&alice(), &id, "Anyone there?").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::UpstreamTimeout);
        assert_eq!(h.store.find(&id).await.unwrap().unwrap().message_count(), 2);
    }

    #[tokio::test]
    async fn store_outage_is_store_unavailable_without_generation() {
        let h = harness(MockTextGenerator::new());
        let id = h.coordinator.start_or_resume(&alice(), "finance", None).await.unwrap();
        h.store.set_unavailable(true);

        let err = h.coordinator.ask(&alice(), &id, "Hello there").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::StoreUnavailable);
        assert_eq!(h.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn cache_write_failure_still_answers_and_history_reconciles() {
        let h = harness(MockTextGenerator::new().with_reply("ok"));
        let id = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();
        h.cache.set_fail_writes(true);

        h.coordinator.ask(&alice(), &id, "Is my flight on time?").await.unwrap();
        assert!(!h.cache.contains(&id).await);

        h.cache.set_fail_writes(false);
        let history = h.coordinator.history(id.as_str(), None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(h.cache.contains(&id).await);
    }

    #[tokio::test]
    async fn history_hit_skips_the_store() {
        let h = harness(MockTextGenerator::new());
        let id = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();
        h.coordinator.ask(&alice(), &id, "Baggage allowance?").await.unwrap();

        let before = h.store.find_calls();
        h.coordinator.history(id.as_str(), None).await.unwrap();
        assert_eq!(h.store.find_calls(), before);
    }

    #[tokio::test]
    async fn malformed_history_id_is_not_found() {
        let h = harness(MockTextGenerator::new());
        let err = h.coordinator.history("../etc/passwd", None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConversationNotFound);
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_anything_is_written() {
        let h = harness(MockTextGenerator::new());
        let err = h
            .coordinator
            .ask_question(AskCommand {
                user_id: alice(),
                domain: "travel".into(),
                question: "   ".into(),
                conversation_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(h
            .coordinator
            .list_for_user(&alice(), "travel")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn list_for_user_titles_from_first_question() {
        let h = harness(MockTextGenerator::new());
        let first = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();
        h.coordinator
            .ask(&alice(), &first, "Can I bring my dog on a transatlantic flight with a connection in Reykjavik?")
            .await
            .unwrap();
        let second = h.coordinator.start_or_resume(&alice(), "travel", None).await.unwrap();
        h.coordinator.ask(&alice(), &second, "Seat upgrade?").await.unwrap();

        let summaries = h.coordinator.list_for_user(&alice(), "Travel").await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].conversation_id, second);
        assert_eq!(summaries[0].title, "Seat upgrade?");
        assert!(summaries[1].title.ends_with('…'));
        assert_eq!(summaries[1].title.chars().count(), 61);
        assert_eq!(summaries[1].message_count, 2);
    }
}
