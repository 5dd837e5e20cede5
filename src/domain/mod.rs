//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `conversation` - Chat transcripts, the domain catalog and prompt assembly
//! - `ticket` - Ticket aggregate, SLA rules and the status graph
//! - `faq` - Suggested-question derivation

pub mod conversation;
pub mod faq;
pub mod foundation;
pub mod ticket;
