//! HTTP handlers for the chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{resolve_caller, OptionalAuth, RequireAuth};
use crate::application::{AskCommand, ConversationCoordinator, FaqSuggestionCache};

use super::dto::{
    AskRequest, AskResponse, ConversationSummaryResponse, FaqQuery, FaqResponse, HistoryQuery,
    MessageResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ChatHandlers {
    coordinator: Arc<ConversationCoordinator>,
    faqs: Arc<FaqSuggestionCache>,
}

impl ChatHandlers {
    pub fn new(coordinator: Arc<ConversationCoordinator>, faqs: Arc<FaqSuggestionCache>) -> Self {
        Self { coordinator, faqs }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /ask - Ask a question, starting a conversation when none is given
pub async fn ask(
    State(handlers): State<ChatHandlers>,
    OptionalAuth(caller): OptionalAuth,
    Json(req): Json<AskRequest>,
) -> Result<Response, ApiError> {
    let user_id = resolve_caller(caller.as_ref(), &req.user_id)?;

    let result = handlers
        .coordinator
        .ask_question(AskCommand {
            user_id,
            domain: req.domain,
            question: req.question,
            conversation_id: req.conversation_id.filter(|id| !id.trim().is_empty()),
        })
        .await?;

    Ok((StatusCode::OK, Json(AskResponse::from(result))).into_response())
}

/// GET /history?domain= - The caller's conversations in a domain
pub async fn list_conversations(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ConversationSummaryResponse>>, ApiError> {
    let summaries = handlers
        .coordinator
        .list_for_user(&user.id, &query.domain)
        .await?;

    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// GET /history/:id - Ordered transcript of one conversation
pub async fn conversation_history(
    State(handlers): State<ChatHandlers>,
    OptionalAuth(caller): OptionalAuth,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    // Agents may read any transcript; users only their own.
    let requester = caller.as_ref().filter(|c| !c.is_agent()).map(|c| &c.id);

    let messages = handlers
        .coordinator
        .history(&conversation_id, requester)
        .await?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// GET /faqs?domain=&limit= - Suggested questions for a domain
pub async fn faqs(
    State(handlers): State<ChatHandlers>,
    Query(query): Query<FaqQuery>,
) -> Result<Json<FaqResponse>, ApiError> {
    let domain = handlers.coordinator.catalog().resolve(&query.domain)?;

    let mut faqs = handlers.faqs.get(&domain.slug).await;
    if let Some(limit) = query.limit {
        faqs.truncate(limit);
    }

    Ok(Json(FaqResponse { faqs }))
}
