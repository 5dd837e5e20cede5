//! Request and response bodies for the chat endpoints.

use serde::{Deserialize, Serialize};

use crate::application::AskResult;
use crate::domain::conversation::{ConversationSummary, Message};

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaqQuery {
    pub domain: String,
    pub limit: Option<usize>,
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub conversation_id: String,
    pub domain: String,
    pub timestamp: String,
}

impl From<AskResult> for AskResponse {
    fn from(result: AskResult) -> Self {
        Self {
            answer: result.answer,
            conversation_id: result.conversation_id.to_string(),
            domain: result.domain.to_string(),
            timestamp: result.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummaryResponse {
    pub conversation_id: String,
    pub title: String,
    pub domain: String,
    pub updated_at: String,
    pub message_count: usize,
}

impl From<ConversationSummary> for ConversationSummaryResponse {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            conversation_id: summary.conversation_id.to_string(),
            title: summary.title,
            domain: summary.domain.to_string(),
            updated_at: summary.updated_at.to_rfc3339(),
            message_count: summary.message_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content,
            timestamp: message.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqResponse {
    pub faqs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Role;
    use crate::domain::foundation::Timestamp;

    #[test]
    fn ask_request_allows_missing_conversation_id() {
        let req: AskRequest = serde_json::from_str(
            r#"{"user_id":"alice","domain":"finance","question":"What is APR?"}"#,
        )
        .unwrap();
        assert!(req.conversation_id.is_none());
    }

    #[test]
    fn message_response_uses_lowercase_role_and_rfc3339() {
        let ts = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let response = MessageResponse::from(Message::new(Role::Assistant, "hi", ts));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["role"], "assistant");
        assert_eq!(json["timestamp"], "2024-01-01T00:00:00Z");
    }
}
