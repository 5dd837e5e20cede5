//! Ticket module - support tickets with SLA deadlines and a status graph.

mod errors;
mod priority;
mod status;
mod thread;
mod ticket;

pub use errors::TicketError;
pub use priority::Priority;
pub use status::TicketStatus;
pub use thread::{Sender, TicketMessage};
pub use ticket::{
    StatusTransition, Ticket, TicketChanges, TransitionSource, MAX_NOTE_CHARS, MAX_SUBJECT_CHARS,
    SLA_BREACH_NOTE,
};
