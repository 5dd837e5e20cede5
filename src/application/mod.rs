//! Application layer - services that coordinate domain objects and ports.
//!
//! - `ConversationCoordinator` owns transcript mutation and the write-through cache
//! - `TicketLifecycle` owns ticket status
//! - `EscalationWatcher` drives SLA escalation on a timer
//! - `FaqSuggestionCache` derives suggestions without writing anything

mod conversation_coordinator;
mod escalation_watcher;
mod faq_suggestion_cache;
mod keyed_lock;
mod ticket_lifecycle;

pub use conversation_coordinator::{
    AskCommand, AskResult, ConversationCoordinator, CoordinatorConfig, APOLOGY_ANSWER,
    MAX_QUESTION_CHARS,
};
pub use escalation_watcher::{EscalationWatcher, EscalationWatcherConfig};
pub use faq_suggestion_cache::{FaqConfig, FaqSuggestionCache};
pub use keyed_lock::{KeyedGuard, KeyedLock};
pub use ticket_lifecycle::{
    CreateTicketCommand, EscalationReport, SlaEvent, SweepOutcome, TicketDetails, TicketLifecycle,
    UpdateTicketCommand,
};
