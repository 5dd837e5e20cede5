//! Domain error vocabulary.
//!
//! [`ValidationError`] is raised by value-object constructors. [`ErrorCode`]
//! is the stable, machine-readable name every domain error maps onto, and is
//! what the HTTP layer puts in the `code` field of an error body.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A rejected input value, always tied to the field it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    EmptyField { field: String },

    #[error("{field} is {actual} characters long; the limit is {max}")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyField { field: field.into() }
    }

    pub fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        Self::TooLong {
            field: field.into(),
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::EmptyField { field }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    ConversationNotFound,
    TicketNotFound,
    InvalidStateTransition,
    ConcurrencyConflict,
    Unauthorized,
    Forbidden,
    UpstreamServiceError,
    UpstreamTimeout,
    StoreUnavailable,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ConversationNotFound => "CONVERSATION_NOT_FOUND",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::InvalidStateTransition => "INVALID_TRANSITION",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::UpstreamServiceError => "UPSTREAM_SERVICE_ERROR",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by aggregate methods: a code, a human message and
/// string details (e.g. `field`, `from`, `to`).
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.field().to_string(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        assert_eq!(
            ValidationError::empty_field("subject").to_string(),
            "subject must not be blank"
        );
        assert_eq!(
            ValidationError::too_long("question", 10, 12).to_string(),
            "question is 12 characters long; the limit is 10"
        );
    }

    #[test]
    fn domain_error_display_leads_with_code() {
        let err = DomainError::new(ErrorCode::TicketNotFound, "no such ticket");
        assert_eq!(err.to_string(), "[TICKET_NOT_FOUND] no such ticket");
    }

    #[test]
    fn validation_converts_with_field_detail() {
        let err: DomainError = ValidationError::invalid_format("priority", "unknown").into();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.detail("field"), Some("priority"));
    }

    #[test]
    fn codes_render_as_screaming_snake_case() {
        assert_eq!(ErrorCode::InvalidStateTransition.to_string(), "INVALID_TRANSITION");
        assert_eq!(ErrorCode::UpstreamTimeout.as_str(), "UPSTREAM_TIMEOUT");
    }
}
