//! In-memory adapters for every store and cache port.
//!
//! They back the test suite and local runs without PostgreSQL or Redis.

mod conversation_cache;
mod conversation_store;
mod ticket_repository;

pub use conversation_cache::InMemoryConversationCache;
pub use conversation_store::InMemoryConversationStore;
pub use ticket_repository::InMemoryTicketRepository;
