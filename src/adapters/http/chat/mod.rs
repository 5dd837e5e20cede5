//! HTTP adapter for conversation and FAQ endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AskRequest, AskResponse, ConversationSummaryResponse, FaqQuery, FaqResponse, HistoryQuery,
    MessageResponse,
};
pub use handlers::ChatHandlers;
pub use routes::chat_routes;
