//! Ticket aggregate.
//!
//! # Invariants
//!
//! - `sla_deadline == created_at + priority.sla_window()` for the priority
//!   at creation; later priority changes never move it
//! - `status` only changes along declared `TicketStatus` edges, and every
//!   change is recorded in `transitions`
//! - `updated_at` strictly increases on every mutation; callers use it as
//!   the optimistic concurrency token

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    DomainError, DomainSlug, StateMachine, TicketId, Timestamp, UserId, ValidationError,
};

use super::priority::Priority;
use super::status::TicketStatus;
use super::thread::{Sender, TicketMessage};

/// Maximum length for a ticket subject.
pub const MAX_SUBJECT_CHARS: usize = 2000;

/// Maximum length for an agent note.
pub const MAX_NOTE_CHARS: usize = 4000;

/// Thread message recorded when the sweep escalates a ticket.
pub const SLA_BREACH_NOTE: &str = "SLA breached: ticket escalated automatically";

/// What caused a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSource {
    /// Requested by an agent.
    Manual,
    /// Forced by the escalation sweep.
    Automatic,
}

impl TransitionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionSource::Manual => "manual",
            TransitionSource::Automatic => "automatic",
        }
    }
}

impl fmt::Display for TransitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransitionSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(TransitionSource::Manual),
            "automatic" => Ok(TransitionSource::Automatic),
            other => Err(ValidationError::invalid_format(
                "source",
                format!("unknown transition source '{}'", other),
            )),
        }
    }
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: TicketStatus,
    pub to: TicketStatus,
    pub source: TransitionSource,
    /// Agent who requested the change; `None` for automatic transitions.
    pub actor: Option<UserId>,
    pub at: Timestamp,
}

/// Field-level update requested by an agent. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketChanges {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub note: Option<String>,
}

impl TicketChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.note.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    user_id: UserId,
    domain: DomainSlug,
    subject: String,
    priority: Priority,
    status: TicketStatus,
    sla_deadline: Timestamp,
    created_at: Timestamp,
    updated_at: Timestamp,
    transitions: Vec<StatusTransition>,
}

impl Ticket {
    /// Opens a new ticket at `now`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the subject is empty or too long
    pub fn open(
        user_id: UserId,
        domain: DomainSlug,
        subject: &str,
        priority: Priority,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::empty_field("summary").into());
        }
        let len = subject.chars().count();
        if len > MAX_SUBJECT_CHARS {
            return Err(ValidationError::too_long("summary", MAX_SUBJECT_CHARS, len).into());
        }

        Ok(Self {
            id: TicketId::new(),
            user_id,
            domain,
            subject: subject.to_string(),
            priority,
            status: TicketStatus::Open,
            sla_deadline: now.plus(priority.sla_window()),
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        })
    }

    /// Reconstitute a ticket from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TicketId,
        user_id: UserId,
        domain: DomainSlug,
        subject: String,
        priority: Priority,
        status: TicketStatus,
        sla_deadline: Timestamp,
        created_at: Timestamp,
        updated_at: Timestamp,
        transitions: Vec<StatusTransition>,
    ) -> Self {
        Self {
            id,
            user_id,
            domain,
            subject,
            priority,
            status,
            sla_deadline,
            created_at,
            updated_at,
            transitions,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn domain(&self) -> &DomainSlug {
        &self.domain
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn sla_deadline(&self) -> Timestamp {
        self.sla_deadline
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Every status change, oldest first.
    pub fn transitions(&self) -> &[StatusTransition] {
        &self.transitions
    }

    /// The status path from `Open` through every recorded transition.
    pub fn status_path(&self) -> Vec<TicketStatus> {
        let mut path = vec![TicketStatus::Open];
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// True when the deadline has passed while the ticket is still workable.
    pub fn is_breached(&self, now: Timestamp) -> bool {
        self.status.is_escalatable() && now.is_after(&self.sla_deadline)
    }

    /// The first thread entry: the subject as written by the user.
    pub fn opening_message(&self) -> TicketMessage {
        TicketMessage::new(self.id, Sender::User, self.subject.clone(), self.created_at)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies an agent update.
    ///
    /// Everything is validated before anything changes, so a rejected update
    /// leaves the ticket untouched. Returns the note as a thread entry when
    /// one was supplied.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if no field is present or the note is empty/too long
    /// - `InvalidStateTransition` if the status edge is not allowed
    pub fn apply(
        &mut self,
        changes: &TicketChanges,
        actor: &UserId,
        now: Timestamp,
    ) -> Result<Option<TicketMessage>, DomainError> {
        if changes.is_empty() {
            return Err(DomainError::validation(
                "body",
                "update must contain status, priority or notes",
            ));
        }

        let note = match changes.note.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::empty_field("notes").into()),
            Some(note) if note.chars().count() > MAX_NOTE_CHARS => {
                return Err(
                    ValidationError::too_long("notes", MAX_NOTE_CHARS, note.chars().count()).into(),
                )
            }
            other => other,
        };

        let next_status = match changes.status {
            Some(target) => Some(
                self.status
                    .transition_to(target)
                    .map_err(|e| e.with_detail("ticket_id", self.id.to_string()))?,
            ),
            None => None,
        };

        let at = now.strictly_after(self.updated_at);
        if let Some(to) = next_status {
            self.transitions.push(StatusTransition {
                from: self.status,
                to,
                source: TransitionSource::Manual,
                actor: Some(actor.clone()),
                at,
            });
            self.status = to;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        self.updated_at = at;

        Ok(note.map(|n| TicketMessage::new(self.id, Sender::Agent, n, at)))
    }

    /// Forces `Escalated` if the SLA deadline has passed.
    ///
    /// Returns the system thread entry when the ticket was escalated, `None`
    /// when nothing changed (not breached, or already escalated/resolved).
    pub fn escalate_for_breach(&mut self, now: Timestamp) -> Option<TicketMessage> {
        if !self.is_breached(now) {
            return None;
        }

        let at = now.strictly_after(self.updated_at);
        self.transitions.push(StatusTransition {
            from: self.status,
            to: TicketStatus::Escalated,
            source: TransitionSource::Automatic,
            actor: None,
            at,
        });
        self.status = TicketStatus::Escalated;
        self.updated_at = at;

        Some(TicketMessage::new(self.id, Sender::System, SLA_BREACH_NOTE, at))
    }

    /// Automatic transitions only (the SLA breach events).
    pub fn automatic_transitions(&self) -> impl Iterator<Item = &StatusTransition> {
        self.transitions
            .iter()
            .filter(|t| t.source == TransitionSource::Automatic)
    }
}
