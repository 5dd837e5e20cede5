//! In-memory ticket repository with the same compare-and-swap semantics as
//! the PostgreSQL adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{TicketId, Timestamp};
use crate::domain::ticket::{Ticket, TicketMessage, TicketStatus};
use crate::ports::{StoreError, TicketRepository};

#[derive(Debug, Clone)]
struct Record {
    ticket: Ticket,
    thread: Vec<TicketMessage>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketRepository {
    records: Arc<RwLock<HashMap<TicketId, Record>>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a stored ticket without any checks.
    ///
    /// Lets tests simulate a writer that slipped in between load and save.
    pub async fn force_put(&self, ticket: Ticket) {
        let mut records = self.records.write().await;
        match records.get_mut(&ticket.id()) {
            Some(record) => record.ticket = ticket,
            None => {
                records.insert(
                    ticket.id(),
                    Record {
                        ticket,
                        thread: Vec::new(),
                    },
                );
            }
        }
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn insert(&self, ticket: &Ticket, opening: &TicketMessage) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&ticket.id()) {
            return Err(StoreError::conflict(format!("ticket {} already exists", ticket.id())));
        }
        records.insert(
            ticket.id(),
            Record {
                ticket: ticket.clone(),
                thread: vec![opening.clone()],
            },
        );
        Ok(())
    }

    async fn find(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.records.read().await.get(&id).map(|r| r.ticket.clone()))
    }

    async fn update(
        &self,
        ticket: &Ticket,
        expected_updated_at: Timestamp,
        message: Option<&TicketMessage>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&ticket.id())
            .ok_or_else(|| StoreError::conflict(format!("ticket {} vanished", ticket.id())))?;

        if record.ticket.updated_at() != expected_updated_at {
            return Err(StoreError::conflict(format!(
                "ticket {} changed since {}",
                ticket.id(),
                expected_updated_at
            )));
        }

        record.ticket = ticket.clone();
        if let Some(message) = message {
            record.thread.push(message.clone());
        }
        Ok(())
    }

    async fn thread(&self, id: TicketId) -> Result<Vec<TicketMessage>, StoreError> {
        let mut thread = self
            .records
            .read()
            .await
            .get(&id)
            .map(|r| r.thread.clone())
            .unwrap_or_default();
        thread.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(thread)
    }

    async fn list_breach_candidates(
        &self,
        now: Timestamp,
        limit: usize,
    ) -> Result<Vec<Ticket>, StoreError> {
        let records = self.records.read().await;
        let mut candidates: Vec<Ticket> = records
            .values()
            .filter(|r| r.ticket.is_breached(now))
            .map(|r| r.ticket.clone())
            .collect();
        candidates.sort_by(|a, b| a.sla_deadline().cmp(&b.sla_deadline()));
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn list_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError> {
        let records = self.records.read().await;
        let mut tickets: Vec<Ticket> = records
            .values()
            .filter(|r| r.ticket.status() == status)
            .map(|r| r.ticket.clone())
            .collect();
        tickets.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(tickets)
    }
}
