//! Conversation module - append-only chat transcripts scoped to a domain.

mod catalog;
mod conversation;
mod errors;
mod message;
mod prompt;

pub use catalog::{CatalogError, DomainCatalog, SupportDomain};
pub use conversation::{derive_title, Conversation, ConversationSummary, UNTITLED};
pub use errors::ConversationError;
pub use message::{Message, Role};
pub use prompt::build_prompt;
