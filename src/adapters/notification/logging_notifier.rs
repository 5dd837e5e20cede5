//! Notifier that emits a structured tracing event instead of sending mail.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::TicketId;
use crate::domain::ticket::Ticket;
use crate::ports::{NotifyError, TicketNotifier};

/// Logs resolutions at info level and remembers which tickets it saw.
#[derive(Debug, Clone, Default)]
pub struct LoggingTicketNotifier {
    sent: Arc<Mutex<Vec<(TicketId, Option<String>)>>>,
}

impl LoggingTicketNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickets notified so far, in order, with the resolution note each
    /// carried.
    pub fn sent_with_notes(&self) -> Vec<(TicketId, Option<String>)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TicketNotifier for LoggingTicketNotifier {
    async fn ticket_resolved(
        &self,
        ticket: &Ticket,
        resolution_note: Option<&str>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            ticket_id = %ticket.id(),
            user_id = %ticket.user_id(),
            domain = %ticket.domain(),
            resolution_note = resolution_note.unwrap_or(""),
            "ticket resolved; owner notified"
        );
        self.sent
            .lock()
            .map_err(|_| NotifyError("notification log poisoned".into()))?
            .push((ticket.id(), resolution_note.map(str::to_string)));
        Ok(())
    }
}
