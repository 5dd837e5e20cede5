//! Request and response bodies for the ticket endpoints.

use serde::{Deserialize, Serialize};

use crate::adapters::http::error::ApiError;
use crate::application::{EscalationReport, SlaEvent, TicketDetails};
use crate::domain::foundation::Timestamp;
use crate::domain::ticket::{Priority, StatusTransition, Ticket, TicketChanges, TicketMessage, TicketStatus};

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub priority: String,
}

/// All fields optional; at least one of status, priority or notes is needed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
    pub expected_updated_at: Option<String>,
}

impl UpdateTicketRequest {
    /// Parses the loosely typed body into domain values.
    pub fn into_changes(self) -> Result<(TicketChanges, Option<Timestamp>), ApiError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TicketStatus>)
            .transpose()?;
        let priority = self
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?;
        let expected = self
            .expected_updated_at
            .as_deref()
            .map(Timestamp::parse_rfc3339)
            .transpose()
            .map_err(|e| ApiError::bad_request("expected_updated_at", e.to_string()))?;

        Ok((
            TicketChanges {
                status,
                priority,
                note: self.notes,
            },
            expected,
        ))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketResponse {
    pub ticket_id: String,
    pub sla_deadline: String,
    pub status: String,
}

impl From<&Ticket> for CreateTicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id().to_string(),
            sla_deadline: ticket.sla_deadline().to_rfc3339(),
            status: ticket.status().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransitionResponse {
    pub from: String,
    pub to: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub at: String,
}

impl From<&StatusTransition> for StatusTransitionResponse {
    fn from(t: &StatusTransition) -> Self {
        Self {
            from: t.from.as_str().to_string(),
            to: t.to.as_str().to_string(),
            source: t.source.as_str().to_string(),
            actor: t.actor.as_ref().map(ToString::to_string),
            at: t.at.to_rfc3339(),
        }
    }
}

/// Ticket fields plus status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket_id: String,
    pub user_id: String,
    pub domain: String,
    pub summary: String,
    pub priority: String,
    pub status: String,
    pub sla_deadline: String,
    pub created_at: String,
    pub updated_at: String,
    pub status_history: Vec<StatusTransitionResponse>,
}

impl From<&Ticket> for TicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id().to_string(),
            user_id: ticket.user_id().to_string(),
            domain: ticket.domain().to_string(),
            summary: ticket.subject().to_string(),
            priority: ticket.priority().as_str().to_string(),
            status: ticket.status().as_str().to_string(),
            sla_deadline: ticket.sla_deadline().to_rfc3339(),
            created_at: ticket.created_at().to_rfc3339(),
            updated_at: ticket.updated_at().to_rfc3339(),
            status_history: ticket.transitions().iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessageResponse {
    pub sender: String,
    pub content: String,
    pub created_at: String,
}

impl From<&TicketMessage> for TicketMessageResponse {
    fn from(message: &TicketMessage) -> Self {
        Self {
            sender: message.sender.as_str().to_string(),
            content: message.content.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailsResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub messages: Vec<TicketMessageResponse>,
}

impl From<&TicketDetails> for TicketDetailsResponse {
    fn from(details: &TicketDetails) -> Self {
        Self {
            ticket: (&details.ticket).into(),
            messages: details.thread.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaEventResponse {
    pub ticket_id: String,
    pub event: String,
    pub timestamp: String,
}

impl From<&SlaEvent> for SlaEventResponse {
    fn from(event: &SlaEvent) -> Self {
        Self {
            ticket_id: event.ticket_id.to_string(),
            event: event.event.clone(),
            timestamp: event.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaReportResponse {
    pub breached_tickets: Vec<TicketResponse>,
    pub sla_events: Vec<SlaEventResponse>,
}

impl From<&EscalationReport> for SlaReportResponse {
    fn from(report: &EscalationReport) -> Self {
        Self {
            breached_tickets: report.breached_tickets.iter().map(Into::into).collect(),
            sla_events: report.sla_events.iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_parses_wire_status_and_token() {
        let req: UpdateTicketRequest = serde_json::from_str(
            r#"{"status":"In-Progress","notes":"looking","expected_updated_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let (changes, expected) = req.into_changes().unwrap();

        assert_eq!(changes.status, Some(TicketStatus::InProgress));
        assert_eq!(changes.priority, None);
        assert_eq!(changes.note.as_deref(), Some("looking"));
        assert_eq!(expected, Some(Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap()));
    }

    #[test]
    fn unknown_status_is_bad_request() {
        let req = UpdateTicketRequest {
            status: Some("Closed".into()),
            ..UpdateTicketRequest::default()
        };
        let err = req.into_changes().unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_token_is_bad_request() {
        let req = UpdateTicketRequest {
            priority: Some("high".into()),
            expected_updated_at: Some("yesterday".into()),
            ..UpdateTicketRequest::default()
        };
        assert!(req.into_changes().is_err());
    }
}
