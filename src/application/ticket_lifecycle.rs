//! TicketLifecycle - the only writer of ticket status.
//!
//! Manual updates are optimistic: the caller may pass the `updated_at` it
//! last saw, and the repository write is a compare-and-swap on the value
//! that was loaded. Either check failing yields `ConcurrencyConflict`.
//! Conflicts are returned to the caller, never retried here.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::conversation::DomainCatalog;
use crate::domain::foundation::{TicketId, Timestamp, UserId};
use crate::domain::ticket::{Priority, Ticket, TicketChanges, TicketError, TicketMessage, TicketStatus};
use crate::ports::{StoreError, TicketNotifier, TicketRepository};

#[derive(Debug, Clone)]
pub struct CreateTicketCommand {
    pub user_id: UserId,
    pub domain: String,
    pub subject: String,
    pub priority: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTicketCommand {
    pub ticket_id: TicketId,
    pub changes: TicketChanges,
    /// Optimistic token; `None` skips the caller-side staleness check.
    pub expected_updated_at: Option<Timestamp>,
}

/// A ticket with its thread, oldest message first.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetails {
    pub ticket: Ticket,
    pub thread: Vec<TicketMessage>,
}

/// One automatic escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaEvent {
    pub ticket_id: TicketId,
    pub event: String,
    pub timestamp: Timestamp,
}

/// Currently escalated tickets plus the breach events behind them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EscalationReport {
    pub breached_tickets: Vec<Ticket>,
    pub sla_events: Vec<SlaEvent>,
}

/// Result of one escalation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub scanned: usize,
    pub escalated: usize,
    /// Tickets that changed underneath the sweep.
    pub skipped: usize,
}

pub struct TicketLifecycle {
    repository: Arc<dyn TicketRepository>,
    notifier: Arc<dyn TicketNotifier>,
    catalog: Arc<DomainCatalog>,
}

fn store_failure(err: StoreError) -> TicketError {
    tracing::error!(error = %err, "ticket store failure");
    TicketError::store_unavailable(err.to_string())
}

impl TicketLifecycle {
    pub fn new(
        repository: Arc<dyn TicketRepository>,
        notifier: Arc<dyn TicketNotifier>,
        catalog: Arc<DomainCatalog>,
    ) -> Self {
        Self {
            repository,
            notifier,
            catalog,
        }
    }

    pub async fn create(&self, cmd: CreateTicketCommand) -> Result<Ticket, TicketError> {
        self.create_at(cmd, Timestamp::now()).await
    }

    /// Opens a ticket created at `now` and seeds its thread with the subject.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unknown domain or priority, or a bad subject
    /// - `StoreUnavailable` if the insert failed
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id))]
    pub async fn create_at(&self, cmd: CreateTicketCommand, now: Timestamp) -> Result<Ticket, TicketError> {
        let domain = self.catalog.resolve(&cmd.domain)?;
        let priority: Priority = cmd.priority.parse()?;

        let ticket = Ticket::open(cmd.user_id, domain.slug.clone(), &cmd.subject, priority, now)?;
        let opening = ticket.opening_message();
        self.repository
            .insert(&ticket, &opening)
            .await
            .map_err(store_failure)?;

        tracing::info!(
            ticket_id = %ticket.id(),
            priority = %ticket.priority(),
            sla_deadline = %ticket.sla_deadline(),
            "ticket created"
        );
        Ok(ticket)
    }

    pub async fn update(&self, cmd: UpdateTicketCommand, actor: &UserId) -> Result<Ticket, TicketError> {
        self.update_at(cmd, actor, Timestamp::now()).await
    }

    /// Applies the present fields of `cmd.changes`.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown ticket
    /// - `Validation` for an empty update or bad note
    /// - `InvalidTransition` if the status edge is not allowed
    /// - `ConcurrencyConflict` if `expected_updated_at` is stale or another
    ///   writer saved first
    #[tracing::instrument(skip(self, cmd, actor), fields(ticket_id = %cmd.ticket_id))]
    pub async fn update_at(
        &self,
        cmd: UpdateTicketCommand,
        actor: &UserId,
        now: Timestamp,
    ) -> Result<Ticket, TicketError> {
        let mut ticket = self.load(cmd.ticket_id).await?;

        if let Some(expected) = cmd.expected_updated_at {
            if expected != ticket.updated_at() {
                tracing::debug!(
                    expected = %expected,
                    actual = %ticket.updated_at(),
                    "stale ticket update rejected"
                );
                return Err(TicketError::ConcurrencyConflict(cmd.ticket_id));
            }
        }

        let loaded_at = ticket.updated_at();
        let previous_status = ticket.status();
        let note = ticket.apply(&cmd.changes, actor, now)?;

        match self.repository.update(&ticket, loaded_at, note.as_ref()).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(TicketError::ConcurrencyConflict(cmd.ticket_id)),
            Err(err) => return Err(store_failure(err)),
        }

        if ticket.status() != previous_status {
            tracing::info!(from = %previous_status, to = %ticket.status(), actor = %actor, "ticket status changed");
        }
        if ticket.status() == TicketStatus::Resolved && previous_status != TicketStatus::Resolved {
            let resolution_note = note.as_ref().map(|message| message.content.as_str());
            if let Err(err) = self.notifier.ticket_resolved(&ticket, resolution_note).await {
                tracing::warn!(ticket_id = %ticket.id(), error = %err, "resolution notification failed");
            }
        }

        Ok(ticket)
    }

    /// The ticket and its thread.
    ///
    /// With a `requester`, tickets owned by someone else are reported as not
    /// found.
    pub async fn get(&self, id: TicketId, requester: Option<&UserId>) -> Result<TicketDetails, TicketError> {
        let ticket = self.load(id).await?;
        if let Some(user) = requester {
            if ticket.user_id() != user {
                return Err(TicketError::not_found(id));
            }
        }

        let thread = self.repository.thread(id).await.map_err(store_failure)?;
        Ok(TicketDetails { ticket, thread })
    }

    /// Escalated tickets and every automatic escalation they went through.
    pub async fn list_escalations(&self) -> Result<EscalationReport, TicketError> {
        let breached_tickets = self
            .repository
            .list_by_status(TicketStatus::Escalated)
            .await
            .map_err(store_failure)?;

        let mut sla_events: Vec<SlaEvent> = breached_tickets
            .iter()
            .flat_map(|ticket| {
                ticket.automatic_transitions().map(move |t| SlaEvent {
                    ticket_id: ticket.id(),
                    event: "escalated".to_string(),
                    timestamp: t.at,
                })
            })
            .collect();
        sla_events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(EscalationReport {
            breached_tickets,
            sla_events,
        })
    }

    /// Escalates up to `limit` tickets whose deadline passed before `now`.
    ///
    /// Tickets that changed since they were listed are skipped; the next
    /// sweep sees their new state.
    pub async fn escalate_overdue(&self, now: Timestamp, limit: usize) -> Result<SweepOutcome, TicketError> {
        let candidates = self
            .repository
            .list_breach_candidates(now, limit)
            .await
            .map_err(store_failure)?;

        let mut outcome = SweepOutcome {
            scanned: candidates.len(),
            ..SweepOutcome::default()
        };

        for mut ticket in candidates {
            let loaded_at = ticket.updated_at();
            let Some(message) = ticket.escalate_for_breach(now) else {
                continue;
            };

            match self.repository.update(&ticket, loaded_at, Some(&message)).await {
                Ok(()) => {
                    outcome.escalated += 1;
                    tracing::info!(
                        ticket_id = %ticket.id(),
                        sla_deadline = %ticket.sla_deadline(),
                        "ticket escalated after SLA breach"
                    );
                }
                Err(StoreError::Conflict(reason)) => {
                    outcome.skipped += 1;
                    tracing::warn!(ticket_id = %ticket.id(), reason = %reason, "ticket changed during sweep; skipped");
                }
                Err(err) => return Err(store_failure(err)),
            }
        }

        Ok(outcome)
    }

    async fn load(&self, id: TicketId) -> Result<Ticket, TicketError> {
        self.repository
            .find(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| TicketError::not_found(id))
    }
}
