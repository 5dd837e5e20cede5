//! HTTP handlers for the ticket endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{resolve_caller, OptionalAuth, RequireAgent};
use crate::application::{CreateTicketCommand, TicketLifecycle, UpdateTicketCommand};
use crate::domain::foundation::TicketId;
use crate::domain::ticket::TicketError;

use super::dto::{
    CreateTicketRequest, CreateTicketResponse, SlaReportResponse, TicketDetailsResponse,
    TicketResponse, UpdateTicketRequest,
};

#[derive(Clone)]
pub struct TicketHandlers {
    lifecycle: Arc<TicketLifecycle>,
}

impl TicketHandlers {
    pub fn new(lifecycle: Arc<TicketLifecycle>) -> Self {
        Self { lifecycle }
    }
}

/// Unparseable ids are indistinguishable from unknown ones.
fn parse_ticket_id(raw: &str) -> Result<TicketId, ApiError> {
    raw.parse::<TicketId>()
        .map_err(|_| TicketError::not_found(raw).into())
}

/// POST /api/tickets - Open a ticket
pub async fn create_ticket(
    State(handlers): State<TicketHandlers>,
    OptionalAuth(caller): OptionalAuth,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Response, ApiError> {
    let user_id = resolve_caller(caller.as_ref(), &req.user_id)?;

    let ticket = handlers
        .lifecycle
        .create(CreateTicketCommand {
            user_id,
            domain: req.domain,
            subject: req.summary,
            priority: req.priority,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CreateTicketResponse::from(&ticket))).into_response())
}

/// GET /api/tickets/:id - Ticket with thread and status history
pub async fn get_ticket(
    State(handlers): State<TicketHandlers>,
    OptionalAuth(caller): OptionalAuth,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketDetailsResponse>, ApiError> {
    let ticket_id = parse_ticket_id(&ticket_id)?;
    let requester = caller.as_ref().filter(|c| !c.is_agent()).map(|c| &c.id);

    let details = handlers.lifecycle.get(ticket_id, requester).await?;
    Ok(Json(TicketDetailsResponse::from(&details)))
}

/// PUT /api/tickets/:id - Agent update of status, priority or notes
pub async fn update_ticket(
    State(handlers): State<TicketHandlers>,
    RequireAgent(agent): RequireAgent,
    Path(ticket_id): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket_id = parse_ticket_id(&ticket_id)?;
    let (changes, expected_updated_at) = req.into_changes()?;

    let ticket = handlers
        .lifecycle
        .update(
            UpdateTicketCommand {
                ticket_id,
                changes,
                expected_updated_at,
            },
            &agent.id,
        )
        .await?;

    Ok(Json(TicketResponse::from(&ticket)))
}

/// GET /api/sla/tickets - Escalated tickets and breach events
pub async fn sla_report(
    State(handlers): State<TicketHandlers>,
    RequireAgent(_agent): RequireAgent,
) -> Result<Json<SlaReportResponse>, ApiError> {
    let report = handlers.lifecycle.list_escalations().await?;
    Ok(Json(SlaReportResponse::from(&report)))
}
