//! Ticket repository port.
//!
//! Updates are compare-and-swap on the ticket's previous `updated_at`: a
//! writer that loses the race gets `StoreError::Conflict` and nothing is
//! written.

use async_trait::async_trait;

use crate::domain::foundation::{TicketId, Timestamp};
use crate::domain::ticket::{Ticket, TicketMessage, TicketStatus};

use super::StoreError;

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a new ticket together with the first thread message.
    async fn insert(&self, ticket: &Ticket, opening: &TicketMessage) -> Result<(), StoreError>;

    /// Load a ticket with its transition history.
    async fn find(&self, id: TicketId) -> Result<Option<Ticket>, StoreError>;

    /// Save a mutated ticket if the stored `updated_at` still equals
    /// `expected_updated_at`. New transitions (those beyond what is stored)
    /// and the optional thread message are written in the same transaction.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the stored ticket changed since it was read
    async fn update(
        &self,
        ticket: &Ticket,
        expected_updated_at: Timestamp,
        message: Option<&TicketMessage>,
    ) -> Result<(), StoreError>;

    /// The ticket thread ordered by `created_at`.
    async fn thread(&self, id: TicketId) -> Result<Vec<TicketMessage>, StoreError>;

    /// Escalatable tickets whose deadline is before `now`, oldest deadline first.
    async fn list_breach_candidates(
        &self,
        now: Timestamp,
        limit: usize,
    ) -> Result<Vec<Ticket>, StoreError>;

    /// Tickets currently in `status`, most recently updated first.
    async fn list_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn TicketRepository) {}
    }
}
