//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `ConversationStore` - Authoritative transcript storage
//! - `ConversationCache` - TTL-bounded transcript mirror
//! - `TicketRepository` - Ticket persistence with compare-and-swap updates
//!
//! ## Collaborator Ports
//!
//! - `TextGenerator` - External answer generation
//! - `TicketNotifier` - Owner notification on resolution
//! - `SessionValidator` - Bearer token validation

mod conversation_cache;
mod conversation_store;
mod session_validator;
mod text_generator;
mod ticket_notifier;
mod ticket_repository;

pub use conversation_cache::{CacheError, ConversationCache};
pub use conversation_store::{ConversationStore, StoreError};
pub use session_validator::SessionValidator;
pub use text_generator::{GenerationEnvelope, GenerationError, TextGenerator};
pub use ticket_notifier::{NotifyError, TicketNotifier};
pub use ticket_repository::TicketRepository;
