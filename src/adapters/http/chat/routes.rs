//! HTTP routes for the chat endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{ask, conversation_history, faqs, list_conversations, ChatHandlers};

/// Creates the chat router.
///
/// # Routes
///
/// - `POST /ask`
/// - `GET /history?domain=` (authenticated)
/// - `GET /history/:id`
/// - `GET /faqs?domain=&limit=`
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/history", get(list_conversations))
        .route("/history/:id", get(conversation_history))
        .route("/faqs", get(faqs))
        .with_state(handlers)
}
