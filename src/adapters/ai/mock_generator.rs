//! Mock text generator for testing and offline runs.
//!
//! # Features
//!
//! - Pre-configured replies, consumed in order
//! - Simulated delays for timeout testing
//! - Error injection
//! - Echo mode that answers with the prompt's current question
//! - Prompt recording for verification
//!
//! # Example
//!
//! ```ignore
//! let generator = MockTextGenerator::new()
//!     .with_reply("Try restarting the router.")
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{GenerationError, TextGenerator};

/// Answer returned once the reply queue is drained.
pub const DEFAULT_MOCK_REPLY: &str = "Thanks for your question. A support specialist will follow up shortly.";

/// A configured mock reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(GenerationError),
}

/// Mock generator. Clones share the reply queue and the call log.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    delay: Duration,
    echo: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        lock(&self.replies).push_back(MockReply::Text(text.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: GenerationError) -> Self {
        lock(&self.replies).push_back(MockReply::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Once the queue is drained, answer `re: <current question>` instead of
    /// [`DEFAULT_MOCK_REPLY`].
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Queue a reply on a shared instance.
    pub fn push_reply(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    fn next_reply(&self, prompt: &str) -> MockReply {
        if let Some(reply) = lock(&self.replies).pop_front() {
            return reply;
        }
        match current_question(prompt) {
            Some(question) if self.echo => MockReply::Text(echo_reply(question)),
            _ => MockReply::Text(DEFAULT_MOCK_REPLY.to_string()),
        }
    }
}

/// The answer an echoing generator gives to `question`.
pub fn echo_reply(question: &str) -> String {
    format!("re: {}", question)
}

fn current_question(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("Current question: "))
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        lock(&self.prompts).push(prompt.to_string());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(err) => Err(err),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
