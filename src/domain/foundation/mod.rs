//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the support desk domain.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, CallerRole};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ConversationId, DomainSlug, TicketId, TicketMessageId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
