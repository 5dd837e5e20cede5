//! Ticket status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a ticket.
///
/// ```text
/// Open ──► In-Progress ──► Resolved
///   │         ▲   │           ▲
///   │         │   ▼           │
///   └──────► Escalated ───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "In-Progress")]
    InProgress,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Escalated")]
    Escalated,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Escalated,
    ];

    /// Statuses the escalation sweep may force to `Escalated`.
    pub fn is_escalatable(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In-Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Escalated => "Escalated",
        }
    }
}

impl StateMachine for TicketStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use TicketStatus::*;
        match self {
            Open => vec![InProgress, Escalated],
            InProgress => vec![Resolved, Escalated],
            Escalated => vec![InProgress, Resolved],
            Resolved => vec![],
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ValidationError;

    /// Accepts the wire form (`In-Progress`) and common variants
    /// (`in_progress`, `in progress`, `inprogress`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match key.as_str() {
            "open" => Ok(TicketStatus::Open),
            "inprogress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "escalated" => Ok(TicketStatus::Escalated),
            "" => Err(ValidationError::empty_field("status")),
            _ => Err(ValidationError::invalid_format(
                "status",
                format!("'{}' is not one of Open, In-Progress, Resolved, Escalated", s.trim()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::*;

    #[test]
    fn allowed_edges_match_graph() {
        let allowed = [
            (Open, InProgress),
            (Open, Escalated),
            (InProgress, Resolved),
            (InProgress, Escalated),
            (Escalated, InProgress),
            (Escalated, Resolved),
        ];
        for from in TicketStatus::ALL {
            for to in TicketStatus::ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn open_cannot_jump_to_resolved() {
        assert!(Open.transition_to(Resolved).is_err());
    }

    #[test]
    fn resolved_is_the_only_terminal_state() {
        for status in TicketStatus::ALL {
            assert_eq!(status.is_terminal(), status == Resolved);
        }
    }

    #[test]
    fn only_open_and_in_progress_are_escalatable() {
        assert!(Open.is_escalatable());
        assert!(InProgress.is_escalatable());
        assert!(!Escalated.is_escalatable());
        assert!(!Resolved.is_escalatable());
    }

    #[test]
    fn wire_form_uses_hyphenated_in_progress() {
        assert_eq!(serde_json::to_string(&InProgress).unwrap(), "\"In-Progress\"");
        let parsed: TicketStatus = serde_json::from_str("\"In-Progress\"").unwrap();
        assert_eq!(parsed, InProgress);
    }

    #[test]
    fn parse_accepts_variants() {
        for raw in ["In-Progress", "in_progress", "in progress", "INPROGRESS"] {
            assert_eq!(raw.parse::<TicketStatus>().unwrap(), InProgress);
        }
        assert!("Breached".parse::<TicketStatus>().is_err());
    }
}
