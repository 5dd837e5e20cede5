//! API error body and status mapping.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | NotFound | 404 |
//! | InvalidTransition, ConcurrencyConflict | 409 |
//! | Upstream failure | 502 |
//! | Upstream timeout | 504 |
//! | StoreUnavailable | 503 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::conversation::ConversationError;
use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::domain::ticket::TicketError;

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn bad_request(field: &str, message: impl Into<String>) -> Self {
        let mut err = Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, message);
        err.body.details = Some(json!({ "field": field }));
        err
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCode::Forbidden, message)
    }

    pub fn code(&self) -> &str {
        &self.body.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.field(), err.to_string())
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        let code = err.code();
        match err {
            ConversationError::Validation(v) => v.into(),
            ConversationError::NotFound(id) => ApiError::new(
                StatusCode::NOT_FOUND,
                code,
                format!("Conversation not found: {}", id),
            ),
            ConversationError::Upstream {
                conversation_id,
                fallback_answer,
                reason,
                timed_out,
            } => {
                let status = if timed_out {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                tracing::warn!(conversation_id = %conversation_id, reason = %reason, "answer degraded to apology");
                let mut api = ApiError::new(status, code, "The answer service is unavailable");
                api.body.details = Some(json!({
                    "conversation_id": conversation_id.as_str(),
                    "answer": fallback_answer,
                }));
                api
            }
            ConversationError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "conversation request failed on store");
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, code, "Storage is temporarily unavailable")
            }
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            TicketError::Validation { field, message } => ApiError::bad_request(&field, message),
            TicketError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, code, message),
            TicketError::InvalidTransition { from, to } => {
                let mut api = ApiError::new(StatusCode::CONFLICT, code, message);
                api.body.details = Some(json!({ "from": from.as_str(), "to": to.as_str() }));
                api
            }
            TicketError::ConcurrencyConflict(id) => {
                let mut api = ApiError::new(StatusCode::CONFLICT, code, message);
                api.body.details = Some(json!({ "ticket_id": id.to_string() }));
                api
            }
            TicketError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "ticket request failed on store");
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, code, "Storage is temporarily unavailable")
            }
        }
    }
}
