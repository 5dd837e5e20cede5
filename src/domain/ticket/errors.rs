//! Ticket-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | InvalidTransition | 409 |
//! | ConcurrencyConflict | 409 |
//! | StoreUnavailable | 503 |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, TicketId, ValidationError};

use super::status::TicketStatus;

/// Errors returned by ticket lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("ticket not found: {0}")]
    NotFound(String),

    #[error("cannot transition ticket from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// The ticket changed between read and write.
    #[error("ticket {0} was modified concurrently")]
    ConcurrencyConflict(TicketId),

    #[error("ticket store unavailable: {0}")]
    StoreUnavailable(String),
}

impl TicketError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TicketError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: impl ToString) -> Self {
        TicketError::NotFound(id.to_string())
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        TicketError::StoreUnavailable(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TicketError::Validation { .. } => ErrorCode::ValidationFailed,
            TicketError::NotFound(_) => ErrorCode::TicketNotFound,
            TicketError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            TicketError::ConcurrencyConflict(_) => ErrorCode::ConcurrencyConflict,
            TicketError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
        }
    }
}

impl From<ValidationError> for TicketError {
    fn from(err: ValidationError) -> Self {
        TicketError::validation(err.field(), err.to_string())
    }
}

/// Lifts aggregate errors. Transition failures carry `from`/`to` details.
impl From<DomainError> for TicketError {
    fn from(err: DomainError) -> Self {
        match err.code() {
            ErrorCode::InvalidStateTransition => {
                let status = |key: &str| {
                    err.details
                        .get(key)
                        .and_then(|raw| raw.parse::<TicketStatus>().ok())
                };
                match (status("from"), status("to")) {
                    (Some(from), Some(to)) => TicketError::InvalidTransition { from, to },
                    _ => TicketError::validation("status", err.message),
                }
            }
            ErrorCode::TicketNotFound => TicketError::NotFound(
                err.details.get("ticket_id").cloned().unwrap_or(err.message),
            ),
            ErrorCode::StoreUnavailable => TicketError::StoreUnavailable(err.message),
            _ => {
                let field = err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "body".to_string());
                TicketError::validation(field, err.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StateMachine;

    #[test]
    fn rejected_edge_becomes_invalid_transition() {
        let err = TicketStatus::Open
            .transition_to(TicketStatus::Resolved)
            .unwrap_err();
        let ticket_err: TicketError = err.into();

        assert_eq!(
            ticket_err,
            TicketError::InvalidTransition {
                from: TicketStatus::Open,
                to: TicketStatus::Resolved,
            }
        );
        assert_eq!(ticket_err.code(), ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn validation_keeps_field_name() {
        let err: TicketError = DomainError::from(ValidationError::empty_field("notes")).into();
        match err {
            TicketError::Validation { field, .. } => assert_eq!(field, "notes"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn conflict_maps_to_concurrency_code() {
        assert_eq!(
            TicketError::ConcurrencyConflict(TicketId::new()).code(),
            ErrorCode::ConcurrencyConflict
        );
    }
}
