//! Ticket notification port.
//!
//! Notifications are best-effort: the lifecycle logs a failed notification
//! and carries on.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ticket::Ticket;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait TicketNotifier: Send + Sync {
    /// Tell the ticket owner their ticket was resolved. `resolution_note` is
    /// the agent note sent with the resolving update, if any.
    async fn ticket_resolved(
        &self,
        ticket: &Ticket,
        resolution_note: Option<&str>,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn TicketNotifier) {}
    }
}
