//! Conversation aggregate.
//!
//! A conversation is the append-only transcript between one user and the
//! assistant inside one support domain.
//!
//! # Invariants
//!
//! - `id` never changes once assigned
//! - messages are strictly increasing by timestamp; nothing is reordered
//!   or removed
//! - `updated_at` equals the timestamp of the newest message (or
//!   `created_at` while the transcript is empty)

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, DomainSlug, Timestamp, UserId};

use super::message::{Message, Role};

/// Title used for conversations that have no user message yet.
pub const UNTITLED: &str = "New conversation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    user_id: UserId,
    domain: DomainSlug,
    messages: Vec<Message>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Starts an empty conversation.
    pub fn start(id: ConversationId, user_id: UserId, domain: DomainSlug, now: Timestamp) -> Self {
        Self {
            id,
            user_id,
            domain,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute a conversation from persistence (no validation).
    pub fn reconstitute(
        id: ConversationId,
        user_id: UserId,
        domain: DomainSlug,
        messages: Vec<Message>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            domain,
            messages,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn domain(&self) -> &DomainSlug {
        &self.domain
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Returns true if `user_id` owns this conversation.
    pub fn belongs_to(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// The last `window` messages, oldest first.
    pub fn recent(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    /// Content of the first user message, if any.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.is_user())
            .map(|m| m.content.as_str())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a message and returns it with its position in the transcript.
    ///
    /// The stored timestamp is `at`, bumped forward when needed so it is
    /// strictly after the previous message.
    pub fn append(&mut self, role: Role, content: impl Into<String>, at: Timestamp) -> (usize, &Message) {
        let floor = self
            .messages
            .last()
            .map(|m| m.timestamp)
            .unwrap_or(self.created_at);
        let timestamp = if self.messages.is_empty() && at >= floor {
            at
        } else {
            at.strictly_after(floor)
        };

        self.messages.push(Message::new(role, content, timestamp));
        self.updated_at = timestamp;

        let seq = self.messages.len() - 1;
        (seq, &self.messages[seq])
    }

    /// Builds the list-view summary of this conversation.
    pub fn summary(&self, title_max_chars: usize) -> ConversationSummary {
        ConversationSummary {
            conversation_id: self.id.clone(),
            title: derive_title(self.first_user_message(), title_max_chars),
            domain: self.domain.clone(),
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }
}

/// List-view projection of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub title: String,
    pub domain: DomainSlug,
    pub updated_at: Timestamp,
    pub message_count: usize,
}

/// Derives a display title from the first user message.
///
/// Whitespace is collapsed; titles longer than `max_chars` are cut on a
/// character boundary and suffixed with an ellipsis.
pub fn derive_title(first_user_message: Option<&str>, max_chars: usize) -> String {
    let collapsed = first_user_message
        .map(|m| m.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    if collapsed.is_empty() {
        return UNTITLED.to_string();
    }
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
